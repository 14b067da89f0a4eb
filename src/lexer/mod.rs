use std::fmt;

use logos::Logos;

use crate::ast::{Precedence, Span};
use crate::registry::Builtin;

/// Result of scanning a quoted string: the unescaped text, or the fact that input ran out first.
#[derive(Debug, Clone, PartialEq)]
enum Quoted {
    Closed(String),
    Unclosed,
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\u{3000}]+")]
enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[token("'", |lex| quoted(lex, '\''))]
    #[token("\"", |lex| quoted(lex, '"'))]
    Quoted(Quoted),

    // The fraction is taken by the callback so that `1..2` leaves `..` for the symbol run.
    #[regex(r"[0-9]+", number)]
    Number(f64),

    #[regex(r"[\-=<>~^$\[\]&|!#+*/.]+")]
    Symbol,

    #[regex(r"[a-zA-Z]+")]
    Word,
}

/// Scans up to the matching quote. `\n` is a newline; any other escaped character stands for itself.
fn quoted(lex: &mut logos::Lexer<RawToken>, quote: char) -> Quoted {
    let rest = lex.remainder();
    let mut value = String::new();
    let mut escaping = false;
    for (i, c) in rest.char_indices() {
        if escaping {
            value.push(if c == 'n' { '\n' } else { c });
            escaping = false;
        } else if c == quote {
            lex.bump(i + c.len_utf8());
            return Quoted::Closed(value);
        } else if c == '\\' {
            escaping = true;
        } else {
            value.push(c);
        }
    }
    lex.bump(rest.len());
    Quoted::Unclosed
}

/// A `.` belongs to the number only when a digit follows it.
fn number(lex: &mut logos::Lexer<RawToken>) -> Option<f64> {
    let rest = lex.remainder().as_bytes();
    if rest.first() == Some(&b'.') && rest.get(1).is_some_and(u8::is_ascii_digit) {
        let fraction = rest[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        lex.bump(1 + fraction);
    }
    lex.slice().parse().ok()
}

/// A lexed token with its byte span in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Number(f64),
    String(String),
    /// A symbolic operator, or the word spelling of one (`and`, `contains`, ...).
    Operator {
        builtin: Builtin,
        spelling: &'static str,
        precedence: Precedence,
    },
    /// A name with no infix form, such as `disp` or `kana`.
    Function {
        builtin: Builtin,
        spelling: &'static str,
    },
}

impl TokenKind {
    /// The spelling a builtin reference was written with.
    pub fn spelling(&self) -> Option<&'static str> {
        match self {
            TokenKind::Operator { spelling, .. } | TokenKind::Function { spelling, .. } => Some(*spelling),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Operator { spelling, .. } => write!(f, "operator '{spelling}'"),
            TokenKind::Function { spelling, .. } => write!(f, "function '{spelling}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unknown operator '{text}'.")]
    UnknownOperator {
        text: String,
        suggestion: Option<&'static str>,
        span: Span,
    },
    #[error("Unknown function '{text}'.")]
    UnknownFunction {
        text: String,
        suggestion: Option<&'static str>,
        span: Span,
    },
    #[error("String not ended.")]
    StringNotEnded { span: Span },
    #[error("Unexpected char '{ch}'.")]
    UnexpectedChar { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnknownOperator { span, .. }
            | LexError::UnknownFunction { span, .. }
            | LexError::StringNotEnded { span }
            | LexError::UnexpectedChar { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LexError::UnknownOperator { .. } => "VQ-L001",
            LexError::UnknownFunction { .. } => "VQ-L002",
            LexError::StringNotEnded { .. } => "VQ-L003",
            LexError::UnexpectedChar { .. } => "VQ-L004",
        }
    }

    /// Closest known spelling for an unknown name.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            LexError::UnknownOperator { suggestion, .. } | LexError::UnknownFunction { suggestion, .. } => *suggestion,
            _ => None,
        }
    }
}

/// Tokenize a query, validating every name against the builtin registry.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        let kind = match result {
            Ok(RawToken::LParen) => TokenKind::LParen,
            Ok(RawToken::RParen) => TokenKind::RParen,
            Ok(RawToken::Number(n)) => TokenKind::Number(n),
            Ok(RawToken::Quoted(Quoted::Closed(s))) => TokenKind::String(s),
            Ok(RawToken::Quoted(Quoted::Unclosed)) => {
                return Err(LexError::StringNotEnded { span: Span::new(span.start, source.len()) });
            }
            Ok(RawToken::Symbol) => symbol(lexer.slice(), span)?,
            Ok(RawToken::Word) => word(lexer.slice(), span)?,
            Err(()) => {
                let ch = source.get(span.start..).and_then(|s| s.chars().next()).unwrap_or('\u{FFFD}');
                let span = Span::new(span.start, span.start + ch.len_utf8());
                return Err(LexError::UnexpectedChar { ch, span });
            }
        };
        tokens.push(Token { kind, span });
    }

    Ok(tokens)
}

fn operator(builtin: Builtin, spelling: &'static str) -> Option<TokenKind> {
    let precedence = builtin.precedence()?;
    Some(TokenKind::Operator { builtin, spelling, precedence })
}

fn symbol(text: &str, span: Span) -> Result<TokenKind, LexError> {
    Builtin::from_symbol(text)
        .and_then(|b| operator(b, b.symbol()?))
        .ok_or_else(|| LexError::UnknownOperator {
            text: text.to_string(),
            suggestion: closest_match(text, Builtin::ALL.iter().filter_map(|b| b.symbol())),
            span,
        })
}

fn word(text: &str, span: Span) -> Result<TokenKind, LexError> {
    let Some(builtin) = Builtin::from_word(text) else {
        return Err(LexError::UnknownFunction {
            text: text.to_string(),
            suggestion: closest_match(text, Builtin::ALL.iter().filter_map(|b| b.word())),
            span,
        });
    };
    let spelling = builtin.word().unwrap_or(builtin.name());
    Ok(operator(builtin, spelling).unwrap_or(TokenKind::Function { builtin, spelling }))
}

/// Nearest candidate within edit distance 3, if any. Case is ignored so `Disp` suggests `disp`.
fn closest_match(name: &str, candidates: impl Iterator<Item = &'static str>) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for candidate in candidates {
        let dist = levenshtein(&name, &candidate.to_ascii_lowercase());
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(s, _)| s)
}

/// Edit distance between two names, keeping one row of the table per character of `a`.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}
