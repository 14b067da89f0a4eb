//! Type inference and overload resolution.
//!
//! Works bottom-up: arguments are resolved first, then the called builtin's signatures are
//! filtered to those whose parameter types equal the argument types exactly. One match is
//! required. There is no coercion and no "first match wins".

use std::sync::Arc;

use crate::ast::{InfixOp, PreNode, Span, Typed};
use crate::lexer::{Token, TokenKind};
use crate::registry::{Builtin, FunctionDef, Registry, Signature};
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error(
        "Arguments ({}) satisfy no signature of function '{}':\n{}",
        type_list(.args), label(.function), .overloads.join("\n")
    )]
    NoMatchingSignature {
        function: &'static str,
        args: Vec<Type>,
        /// Every overload of the function, one per line.
        overloads: Vec<String>,
        span: Span,
    },
    #[error(
        "Arguments ({}) satisfy multiple signatures of function '{}':\n{}",
        type_list(.args), label(.function), .overloads.join("\n")
    )]
    AmbiguousSignature {
        function: &'static str,
        args: Vec<Type>,
        /// Every overload; the matching ones are marked with `!`.
        overloads: Vec<String>,
        span: Span,
    },
    #[error("Only function identifiers can be called, but got {found}.")]
    NotCallable { found: String, span: Span },
    #[error("The root expression should be {expected}, but got {found}.")]
    RootTypeMismatch { expected: Type, found: Type, span: Span },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::NoMatchingSignature { span, .. }
            | ResolveError::AmbiguousSignature { span, .. }
            | ResolveError::NotCallable { span, .. }
            | ResolveError::RootTypeMismatch { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::NoMatchingSignature { .. } => "VQ-T001",
            ResolveError::AmbiguousSignature { .. } => "VQ-T002",
            ResolveError::NotCallable { .. } => "VQ-T003",
            ResolveError::RootTypeMismatch { .. } => "VQ-T004",
        }
    }
}

type Result<T> = std::result::Result<T, ResolveError>;

fn type_list(types: &[Type]) -> String {
    types.iter().map(Type::to_string).collect::<Vec<_>>().join(" ")
}

/// Symbolic names are parenthesized so `(->)` reads as a name in listings.
fn label(spelling: &str) -> String {
    if spelling.starts_with(|c: char| c.is_ascii_alphabetic()) {
        spelling.to_string()
    } else {
        format!("({spelling})")
    }
}

fn overloads(def: &FunctionDef, spelling: &str, highlight: &[&Arc<Signature>]) -> Vec<String> {
    def.signatures
        .iter()
        .map(|sig| {
            let mark = if highlight.iter().any(|h| Arc::ptr_eq(h, sig)) { '!' } else { '-' };
            format!("{mark} {} :: {sig}", label(spelling))
        })
        .collect()
}

struct Resolver<'r> {
    registry: &'r Registry,
}

impl Resolver<'_> {
    fn node(&self, node: &PreNode) -> Result<Typed> {
        match node {
            PreNode::Value(token) => self.value(token),
            PreNode::Infix { op: InfixOp::Operator { builtin, spelling, .. }, lhs, rhs, .. } => {
                let lhs = self.node(lhs)?;
                let rhs = self.node(rhs)?;
                let span = lhs.span().merge(rhs.span());
                self.call(*builtin, *spelling, vec![lhs, rhs], span)
            }
            PreNode::Infix { op: InfixOp::Application, .. } => self.application(node),
        }
    }

    fn value(&self, token: &Token) -> Result<Typed> {
        let span = token.span;
        match &token.kind {
            TokenKind::Number(value) => Ok(Typed::Number { value: *value, span }),
            TokenKind::String(value) => Ok(Typed::String { value: value.clone(), span }),
            TokenKind::Function { builtin, spelling } | TokenKind::Operator { builtin, spelling, .. } => {
                self.call(*builtin, *spelling, Vec::new(), span)
            }
            TokenKind::LParen | TokenKind::RParen => Err(ResolveError::NotCallable { found: token.kind.to_string(), span }),
        }
    }

    /// `f a b` arrives as `App(App(f, a), b)`; walk the left spine to recover `f` and `[a, b]`.
    fn application(&self, node: &PreNode) -> Result<Typed> {
        let mut pending = Vec::new();
        let mut head = node;
        while let PreNode::Infix { op: InfixOp::Application, lhs, rhs, .. } = head {
            pending.push(rhs.as_ref());
            head = lhs.as_ref();
        }
        pending.reverse();

        let PreNode::Value(Token {
            kind: TokenKind::Function { builtin, spelling } | TokenKind::Operator { builtin, spelling, .. },
            span: head_span,
        }) = head
        else {
            let found = match head {
                PreNode::Value(token) => token.kind.to_string(),
                PreNode::Infix { .. } => "a parenthesized expression".to_string(),
            };
            return Err(ResolveError::NotCallable { found, span: head.span() });
        };

        let args = pending.into_iter().map(|arg| self.node(arg)).collect::<Result<Vec<_>>>()?;
        let span = args.last().map_or(*head_span, |last| head_span.merge(last.span()));
        self.call(*builtin, *spelling, args, span)
    }

    fn call(&self, builtin: Builtin, spelling: &'static str, args: Vec<Typed>, span: Span) -> Result<Typed> {
        let def = self.registry.function(builtin);
        let arg_types: Vec<&Type> = args.iter().map(Typed::ty).collect();
        let matching: Vec<&Arc<Signature>> = def.matching(&arg_types).collect();

        let signature = match matching.as_slice() {
            [one] => Arc::clone(one),
            [] => {
                return Err(ResolveError::NoMatchingSignature {
                    function: spelling,
                    args: arg_types.into_iter().cloned().collect(),
                    overloads: overloads(def, spelling, &[]),
                    span,
                });
            }
            several => {
                return Err(ResolveError::AmbiguousSignature {
                    function: spelling,
                    args: arg_types.iter().map(|&t| t.clone()).collect(),
                    overloads: overloads(def, spelling, several),
                    span,
                });
            }
        };

        Ok(Typed::Call { function: builtin, args, signature, span })
    }
}

/// Resolve a parsed tree against `registry`, choosing one signature for every call.
pub fn resolve(node: &PreNode, registry: &Registry) -> Result<Typed> {
    Resolver { registry }.node(node)
}

/// Require the resolved tree to produce `expected`, as a filter predicate must produce Boolean.
pub fn expect_root(root: &Typed, expected: &Type) -> Result<()> {
    if root.ty() == expected {
        return Ok(());
    }
    Err(ResolveError::RootTypeMismatch { expected: expected.clone(), found: root.ty().clone(), span: root.span() })
}
