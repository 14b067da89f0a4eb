use crate::ast::{APPLICATION, InfixOp, Precedence, PreNode, Span};
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("{}", unexpected(.found, .expected))]
    UnexpectedToken {
        /// Description of the offending token; `None` at end of input.
        found: Option<String>,
        expected: Option<&'static str>,
        span: Span,
    },
    #[error("Operator '{operator}' doesn't have RHS.")]
    MissingRightOperand { operator: &'static str, span: Span },
    #[error("Expect ')' to close '(', but got end of input.")]
    ExpectedClosingParen { open: Span, span: Span },
    #[error("Expression nests deeper than {limit} levels.")]
    TooDeep { limit: usize, span: Span },
}

fn unexpected(found: &Option<String>, expected: &Option<&'static str>) -> String {
    let found = found.as_deref().unwrap_or("end of input");
    match expected {
        Some(expected) => format!("Expect {expected}, but got {found}."),
        None => format!("Unexpected {found}."),
    }
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::MissingRightOperand { span, .. }
            | ParseError::ExpectedClosingParen { span, .. }
            | ParseError::TooDeep { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnexpectedToken { .. } => "VQ-P001",
            ParseError::MissingRightOperand { .. } => "VQ-P002",
            ParseError::ExpectedClosingParen { .. } => "VQ-P003",
            ParseError::TooDeep { .. } => "VQ-P004",
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Deepest tree, and deepest parenthesis nesting, a query may have. Every later stage walks the
/// tree recursively, so anything deeper is rejected here.
pub const MAX_DEPTH: usize = 128;

// ---- Operator arena ----

/// Index into one of the tier's arenas.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Ref {
    Leaf(usize),
    Infix(usize),
}

/// An infix node under construction. Its operands are filled in as tokens arrive, and a later,
/// tighter operator may take over `rhs` and become its right child.
#[derive(Debug)]
struct PendingInfix {
    op: InfixOp,
    precedence: Precedence,
    lhs: Option<Ref>,
    rhs: Option<Ref>,
}

/// Parse state for one level of parentheses: the current root and the stack of open operators.
/// Nodes live in flat arenas and refer to each other by index until the tier is assembled.
#[derive(Debug, Default)]
struct Tier {
    leaves: Vec<Option<PreNode>>,
    /// Depth of the subtree held by each leaf; parenthesized groups are deeper than one.
    leaf_depths: Vec<usize>,
    infixes: Vec<PendingInfix>,
    root: Option<Ref>,
    stack: Vec<usize>,
}

impl Tier {
    /// True when the next token has to be an operand: nothing parsed yet, or the newest operator
    /// still lacks its right side. An operator token met here is a function reference instead.
    fn expects_operand(&self) -> bool {
        self.root.is_none() || self.stack.last().is_some_and(|&top| self.infixes[top].rhs.is_none())
    }

    /// Places a complete operand. Next to an existing expression it starts an application:
    /// `f a` becomes `Application(f, a)`.
    fn push_value(&mut self, node: PreNode, depth: usize) {
        let leaf = Ref::Leaf(self.leaves.len());
        self.leaves.push(Some(node));
        self.leaf_depths.push(depth);
        if !self.expects_operand() {
            self.push_infix(InfixOp::Application, APPLICATION);
        }
        match self.stack.last() {
            Some(&top) if self.infixes[top].rhs.is_none() => self.infixes[top].rhs = Some(leaf),
            _ => self.root = Some(leaf),
        }
    }

    /// Precedence climbing against the explicit stack. Operators binding at least as tightly are
    /// closed (left associativity); the first looser one adopts the new operator as its right child.
    fn push_infix(&mut self, op: InfixOp, precedence: Precedence) {
        let mut parent = None;
        while let Some(&top) = self.stack.last() {
            if self.infixes[top].precedence < precedence {
                parent = Some(top);
                break;
            }
            self.stack.pop();
        }

        let index = self.infixes.len();
        let lhs = match parent {
            Some(top) => self.infixes[top].rhs.replace(Ref::Infix(index)),
            None => self.root.replace(Ref::Infix(index)),
        };
        self.infixes.push(PendingInfix { op, precedence, lhs, rhs: None });
        self.stack.push(index);
    }

    /// Returns the assembled tree together with its depth.
    fn finish(mut self) -> Result<Option<(PreNode, usize)>> {
        if let Some(&top) = self.stack.last() {
            let pending = &self.infixes[top];
            if let (None, InfixOp::Operator { spelling, span, .. }) = (pending.rhs, &pending.op) {
                return Err(ParseError::MissingRightOperand { operator: *spelling, span: *span });
            }
        }
        let Some(root) = self.root.take() else {
            return Ok(None);
        };
        let depth = self.depth(root)?;
        Ok(self.assemble(root).map(|node| (node, depth)))
    }

    /// Measures the arena tree with an explicit stack, so a long operator chain is rejected
    /// before `assemble` recurses into it.
    /// The error points at the deepest leaf.
    fn depth(&self, root: Ref) -> Result<usize> {
        let (mut deepest, mut deepest_leaf) = (0, 0);
        let mut pending = vec![(root, 1)];
        while let Some((node, level)) = pending.pop() {
            match node {
                Ref::Leaf(i) => {
                    let depth = level + self.leaf_depths[i] - 1;
                    if depth > deepest {
                        (deepest, deepest_leaf) = (depth, i);
                    }
                }
                Ref::Infix(i) => {
                    let infix = &self.infixes[i];
                    pending.extend(infix.rhs.map(|rhs| (rhs, level + 1)));
                    pending.extend(infix.lhs.map(|lhs| (lhs, level + 1)));
                }
            }
        }
        if deepest > MAX_DEPTH {
            let span = self.leaves[deepest_leaf].as_ref().map_or(Span::UNKNOWN, PreNode::span);
            return Err(ParseError::TooDeep { limit: MAX_DEPTH, span });
        }
        Ok(deepest)
    }

    /// Moves nodes out of the arenas into an owned tree. Every reachable slot is filled once
    /// `finish` has checked for a missing right operand.
    fn assemble(&mut self, node: Ref) -> Option<PreNode> {
        match node {
            Ref::Leaf(i) => self.leaves[i].take(),
            Ref::Infix(i) => {
                let (op, precedence) = (self.infixes[i].op.clone(), self.infixes[i].precedence);
                let (lhs, rhs) = (self.infixes[i].lhs?, self.infixes[i].rhs?);
                Some(PreNode::Infix {
                    op,
                    precedence,
                    lhs: Box::new(self.assemble(lhs)?),
                    rhs: Box::new(self.assemble(rhs)?),
                })
            }
        }
    }
}

// ---- Token driver ----

pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    source_len: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token], source_len: usize) -> Self {
        Parser { tokens, pos: 0, source_len }
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Span of the most recently consumed token.
    fn last_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::at(self.source_len), |t| t.span)
    }

    /// Parses the whole token stream. `None` means there was nothing to parse.
    pub fn parse_query(&mut self) -> Result<Option<PreNode>> {
        Ok(self.parse_tier(None, 0)?.map(|(node, _)| node))
    }

    /// Parses until end of input, or until the `)` matching the `(` at `open`. `nesting` counts
    /// the parentheses already open.
    fn parse_tier(&mut self, open: Option<Span>, nesting: usize) -> Result<Option<(PreNode, usize)>> {
        let mut tier = Tier::default();

        loop {
            let Some(token) = self.advance() else {
                if let Some(open) = open {
                    return Err(ParseError::ExpectedClosingParen { open, span: Span::at(self.source_len) });
                }
                break;
            };

            match &token.kind {
                TokenKind::Number(_) | TokenKind::String(_) | TokenKind::Function { .. } => {
                    tier.push_value(PreNode::Value(token.clone()), 1);
                }
                TokenKind::Operator { builtin, spelling, precedence } => {
                    if tier.expects_operand() {
                        tier.push_value(PreNode::Value(token.clone()), 1);
                    } else {
                        let op = InfixOp::Operator { builtin: *builtin, spelling: *spelling, span: token.span };
                        tier.push_infix(op, *precedence);
                    }
                }
                TokenKind::LParen if nesting >= MAX_DEPTH => {
                    return Err(ParseError::TooDeep { limit: MAX_DEPTH, span: token.span });
                }
                TokenKind::LParen => match self.parse_tier(Some(token.span), nesting + 1)? {
                    Some((inner, depth)) => tier.push_value(inner, depth),
                    // `f()` applies f to nothing
                    None if !tier.expects_operand() => {}
                    None => {
                        return Err(ParseError::UnexpectedToken {
                            found: Some(TokenKind::RParen.to_string()),
                            expected: Some("expression"),
                            span: self.last_span(),
                        });
                    }
                },
                TokenKind::RParen => {
                    if open.is_some() {
                        break;
                    }
                    return Err(ParseError::UnexpectedToken {
                        found: Some(token.kind.to_string()),
                        expected: None,
                        span: token.span,
                    });
                }
            }
        }

        tier.finish()
    }
}

/// Parse a token stream into a pre-typed tree. `source_len` positions end-of-input errors.
pub fn parse(tokens: &[Token], source_len: usize) -> Result<Option<PreNode>> {
    Parser::new(tokens, source_len).parse_query()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn sexpr(node: &PreNode) -> String {
        match node {
            PreNode::Value(token) => match &token.kind {
                TokenKind::Number(n) => n.to_string(),
                TokenKind::String(s) => format!("'{s}'"),
                kind => kind.spelling().unwrap_or("?").to_string(),
            },
            PreNode::Infix { op: InfixOp::Application, lhs, rhs, .. } => {
                format!("(@ {} {})", sexpr(lhs), sexpr(rhs))
            }
            PreNode::Infix { op: InfixOp::Operator { spelling, .. }, lhs, rhs, .. } => {
                format!("({spelling} {} {})", sexpr(lhs), sexpr(rhs))
            }
        }
    }

    fn parse_str(source: &str) -> Result<Option<PreNode>> {
        let tokens = lex(source).unwrap();
        parse(&tokens, source.len())
    }

    fn shape(source: &str) -> String {
        sexpr(&parse_str(source).unwrap().unwrap())
    }

    #[test]
    fn empty_input_is_none() {
        assert_eq!(parse_str("").unwrap(), None);
        assert_eq!(parse_str(" \u{3000}\t").unwrap(), None);
    }

    #[test]
    fn single_value() {
        assert_eq!(shape("testable"), "testable");
        assert_eq!(shape("'x'"), "'x'");
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(shape("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(shape("1 * 2 + 3"), "(+ (* 1 2) 3)");
        assert_eq!(shape("1 - 2 - 3"), "(- (- 1 2) 3)");
    }

    #[test]
    fn connective_precedence() {
        assert_eq!(
            shape("contains disp 'x' & contains sub 'y' | contains meaning 'z'"),
            "(| (& (@ (@ contains disp) 'x') (@ (@ contains sub) 'y')) (@ (@ contains meaning) 'z'))"
        );
        assert_eq!(shape("true | false & false"), "(| true (& false false))");
    }

    #[test]
    fn application_binds_tighter_than_operators() {
        assert_eq!(shape("now + hour 1"), "(+ now (@ hour 1))");
        assert_eq!(shape("inTest (tests # 3) correct"), "(@ (@ inTest (# tests 3)) correct)");
    }

    #[test]
    fn juxtaposition_matches_explicit_infix() {
        // both spellings put the same operands in the same order
        assert_eq!(shape("contains disp 'x'"), "(@ (@ contains disp) 'x')");
        assert_eq!(shape("disp contains 'x'"), "(contains disp 'x')");
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(shape("(1 + 2) * 3"), "(* (+ 1 2) 3)");
        assert_eq!(shape("((testable))"), "testable");
        assert_eq!(shape("kana ('a')"), "(@ kana 'a')");
    }

    #[test]
    fn prefix_operators_are_values() {
        assert_eq!(shape("not testable"), "(@ not testable)");
        assert_eq!(shape("testable & ! true"), "(& testable (@ ! true))");
        assert_eq!(shape("easiness > -1"), "(> easiness (@ - 1))");
    }

    #[test]
    fn empty_parens_apply_nothing() {
        assert_eq!(shape("now()"), "now");
        assert_eq!(shape("now() > createTime()"), "(> now createTime)");
    }

    #[test]
    fn empty_parens_without_function() {
        let err = parse_str("()").unwrap_err();
        assert_eq!(err.span(), Span::new(1, 2));
        assert_eq!(err.to_string(), "Expect expression, but got ')'.");
        assert!(parse_str("disp -> ()").is_err());
    }

    #[test]
    fn stray_close_paren() {
        let err = parse_str("testable)").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken { found: Some("')'".into()), expected: None, span: Span::new(8, 9) }
        );
        assert_eq!(err.code(), "VQ-P001");
    }

    #[test]
    fn unclosed_paren_points_at_end() {
        let err = parse_str("(testable & true").unwrap_err();
        assert_eq!(err, ParseError::ExpectedClosingParen { open: Span::new(0, 1), span: Span::at(16) });
    }

    #[test]
    fn missing_right_operand() {
        let err = parse_str("easiness >").unwrap_err();
        assert_eq!(err, ParseError::MissingRightOperand { operator: ">", span: Span::new(9, 10) });
        assert_eq!(err.to_string(), "Operator '>' doesn't have RHS.");

        let err = parse_str("(testable and)").unwrap_err();
        assert!(matches!(err, ParseError::MissingRightOperand { operator: "and", .. }));
    }

    #[test]
    fn deep_parentheses_are_rejected() {
        let source = format!("{}testable{}", "(".repeat(5_000), ")".repeat(5_000));
        let err = parse_str(&source).unwrap_err();
        assert_eq!(err, ParseError::TooDeep { limit: MAX_DEPTH, span: Span::new(MAX_DEPTH, MAX_DEPTH + 1) });
        assert_eq!(err.code(), "VQ-P004");

        let limit = format!("{}testable{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(shape(&limit), "testable");
    }

    #[test]
    fn long_chains_are_rejected() {
        let source = format!("1{}", " + 1".repeat(5_000));
        let err = parse_str(&source).unwrap_err();
        assert_eq!(err, ParseError::TooDeep { limit: MAX_DEPTH, span: Span::new(0, 1) });
        assert_eq!(err.to_string(), format!("Expression nests deeper than {MAX_DEPTH} levels."));

        let applications = format!("now{}", "()".repeat(5_000));
        assert_eq!(shape(&applications), "now");
        let chained = format!("contains disp{}", " 'x'".repeat(5_000));
        assert!(matches!(parse_str(&chained), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn depth_counts_through_parentheses() {
        // 64 nested groups of two additions each: 2 * 64 + 1 levels
        let mut source = String::from("1");
        for _ in 0..64 {
            source = format!("1 + (1 + {source})");
        }
        assert!(matches!(parse_str(&source), Err(ParseError::TooDeep { .. })));
        let (_, depth) = Parser::new(&lex("1 + (1 + 1)").unwrap(), 11).parse_tier(None, 0).unwrap().unwrap();
        assert_eq!(depth, 3);
    }

    #[test]
    fn spans_cover_operands() {
        let tree = parse_str("easiness > 2").unwrap().unwrap();
        assert_eq!(tree.span(), Span::new(0, 12));
    }
}
