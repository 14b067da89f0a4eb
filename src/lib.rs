//! A typed filter-expression language for vocabulary flashcard collections.
//!
//! A query goes through four stages: [`lexer::lex`] turns text into tokens naming builtins,
//! [`parser::parse`] builds a precedence tree where juxtaposition is function application,
//! [`resolve::resolve`] picks exactly one signature per call, and [`interpreter::evaluate`] runs the
//! typed tree against one word at a time. [`compile`] drives the first three and wraps failures in
//! a [`QueryError`] that remembers the query and the offending span.
//!
//! ```
//! use vocab_query::{CompileOptions, compile};
//! use vocab_query::context::{EvalContext, Timestamp, Word};
//!
//! let query = compile("disp -> 'cat'", CompileOptions::default()).unwrap();
//! let word = Word { disp: "concatenate".into(), ..Word::default() };
//! assert!(query.matches(&EvalContext::new(&word, &[], Timestamp(0))));
//! ```

use std::fmt;

use serde::Serialize;

pub mod ast;
pub mod codegen;
pub mod context;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod resolve;
pub mod template;
pub mod types;

use ast::{Span, Typed};
use context::{Collection, EvalContext, Timestamp, Word};
use interpreter::Value;
use lexer::LexError;
use parser::ParseError;
use registry::Registry;
use resolve::ResolveError;
use types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Parse the input as a query. When false the input is a plain search term matched against
    /// the word's text, directly and through `kana`.
    pub advanced: bool,
    /// Require the query to produce a Boolean, as a filter predicate must.
    pub expect_boolean: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { advanced: true, expect_boolean: true }
    }
}

/// The pipeline stage that rejected a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Tokenize,
    Parse,
    Postproc,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Tokenize => "Tokenize",
            Stage::Parse => "Parse",
            Stage::Postproc => "Postproc",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Lex(_) => Stage::Tokenize,
            StageError::Parse(_) => Stage::Parse,
            StageError::Resolve(_) => Stage::Postproc,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            StageError::Lex(e) => e.span(),
            StageError::Parse(e) => e.span(),
            StageError::Resolve(e) => e.span(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StageError::Lex(e) => e.code(),
            StageError::Parse(e) => e.code(),
            StageError::Resolve(e) => e.code(),
        }
    }
}

/// A failed compile. Keeps the query text that was actually processed (the synthesized one in
/// simple mode) so the span can be shown against it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}Error: {}", .error.stage(), .error)]
pub struct QueryError {
    pub query: String,
    pub error: StageError,
}

impl QueryError {
    pub fn stage(&self) -> Stage {
        self.error.stage()
    }

    pub fn span(&self) -> Span {
        self.error.span()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }

    /// Plain-text caret diagnostic:
    ///
    /// ```text
    /// TokenizeError
    /// disp -> 'x
    ///         ^^ String not ended.
    /// ```
    ///
    /// Characters outside printable ASCII echo as `#` so every character takes one column.
    pub fn render(&self) -> String {
        let span = self.span();
        let chars_before = |offset: usize| {
            let offset = offset.min(self.query.len());
            self.query.get(..offset).map_or(offset, |s| s.chars().count())
        };
        let spaces = chars_before(span.start);
        let carets = chars_before(span.end).saturating_sub(spaces).max(1);
        let echo: String =
            self.query.chars().map(|c| if (' '..='\u{7f}').contains(&c) { c } else { '#' }).collect();
        let message = self.message().replace('\n', &format!("\n{}", " ".repeat(spaces + carets + 1)));
        format!("{}Error\n{echo}\n{}{} {message}", self.stage(), " ".repeat(spaces), "^".repeat(carets))
    }
}

/// A compiled query, ready to be evaluated against any number of words.
#[derive(Debug, Clone)]
pub enum Compiled {
    /// The input was blank. Matches everything.
    Empty,
    Query(Query),
}

impl Compiled {
    pub fn matches(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Compiled::Empty => true,
            Compiled::Query(query) => query.matches(ctx),
        }
    }

    /// Words of `collection` the query accepts, in collection order.
    pub fn filter<'c>(&'c self, collection: &'c Collection, now: Timestamp) -> impl Iterator<Item = &'c Word> + 'c {
        collection.words.iter().filter(move |word| {
            let ctx = EvalContext::new(word, &collection.tests, now).with_words(&collection.words);
            self.matches(&ctx)
        })
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    /// Text the tree was compiled from.
    pub source: String,
    pub root: Typed,
}

impl Query {
    pub fn ty(&self) -> &Type {
        self.root.ty()
    }

    pub fn evaluate<'a>(&self, ctx: &EvalContext<'a>) -> Value<'a> {
        interpreter::evaluate(&self.root, ctx)
    }

    /// True when the query evaluates to Boolean true. Non-Boolean queries never match.
    pub fn matches(&self, ctx: &EvalContext<'_>) -> bool {
        matches!(self.evaluate(ctx), Value::Boolean(true))
    }
}

/// Canonical s-expression form, e.g. `(contains text 'x')`.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codegen::fmt::format(&self.root, codegen::fmt::FmtMode::Dense))
    }
}

/// The lexer skips exactly these; anything else is either a token or an error.
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{3000}')
}

/// Search term to the query simple mode stands for.
pub fn simple_query(term: &str) -> String {
    let term = codegen::fmt::quote(term);
    format!("contains text {term} or contains text (kana {term})")
}

/// Lex, parse and resolve `input` against the standard library.
pub fn compile(input: &str, options: CompileOptions) -> Result<Compiled, QueryError> {
    compile_with(input, options, Registry::standard())
}

pub fn compile_with(input: &str, options: CompileOptions, registry: &Registry) -> Result<Compiled, QueryError> {
    if input.chars().all(is_blank) {
        return Ok(Compiled::Empty);
    }
    let source = if options.advanced { input.to_string() } else { simple_query(input) };
    let fail = |error: StageError| QueryError { query: source.clone(), error };

    let tokens = lexer::lex(&source).map_err(|e| fail(e.into()))?;
    let Some(tree) = parser::parse(&tokens, source.len()).map_err(|e| fail(e.into()))? else {
        return Ok(Compiled::Empty);
    };
    let root = resolve::resolve(&tree, registry).map_err(|e| fail(e.into()))?;
    if options.expect_boolean {
        resolve::expect_root(&root, &types::BOOLEAN).map_err(|e| fail(e.into()))?;
    }
    Ok(Compiled::Query(Query { source, root }))
}
