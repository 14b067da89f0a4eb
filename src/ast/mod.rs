use std::sync::Arc;

use serde::Serialize;

use crate::lexer::Token;
use crate::registry::{Builtin, Signature};
use crate::types::{self, Type};

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within the query text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Zero-width span at `offset`, used for "end of input" positions.
    pub fn at(offset: usize) -> Self {
        Span { start: offset, end: offset }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span { start: range.start, end: range.end }
    }
}

// ---- Pre-typed tree (parser output) ----

/// Operator precedence. Application chains sit above every symbolic operator.
pub type Precedence = u8;

pub const APPLICATION: Precedence = Precedence::MAX;

/// How an infix node was formed.
#[derive(Debug, Clone, PartialEq)]
pub enum InfixOp {
    /// An explicit operator token such as `&` or `contains`.
    Operator {
        builtin: Builtin,
        spelling: &'static str,
        span: Span,
    },
    /// Two expressions written side by side: `f x`.
    Application,
}

/// Parser output. Discarded once the resolver has produced a [`Typed`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PreNode {
    Value(Token),
    Infix {
        op: InfixOp,
        precedence: Precedence,
        lhs: Box<PreNode>,
        rhs: Box<PreNode>,
    },
}

impl PreNode {
    pub fn span(&self) -> Span {
        match self {
            PreNode::Value(token) => token.span,
            PreNode::Infix { lhs, rhs, .. } => lhs.span().merge(rhs.span()),
        }
    }
}

// ---- Typed tree (resolver output) ----

/// A fully resolved query. Every call carries the one signature chosen for it, so evaluation needs
/// no further lookup. Immutable and `Send + Sync`: one tree can be evaluated from many threads.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Typed {
    Number {
        value: f64,
        #[serde(skip)]
        span: Span,
    },
    String {
        value: String,
        #[serde(skip)]
        span: Span,
    },
    Call {
        function: Builtin,
        args: Vec<Typed>,
        #[serde(serialize_with = "serialize_signature")]
        signature: Arc<Signature>,
        #[serde(skip)]
        span: Span,
    },
}

impl Typed {
    pub fn ty(&self) -> &Type {
        match self {
            Typed::Number { .. } => &types::NUMBER,
            Typed::String { .. } => &types::STRING,
            Typed::Call { signature, .. } => &signature.ret,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Typed::Number { span, .. } | Typed::String { span, .. } | Typed::Call { span, .. } => *span,
        }
    }

    /// The signature chosen for a call node, `None` for literals.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Typed::Call { signature, .. } => Some(signature),
            _ => None,
        }
    }
}

fn serialize_signature<S: serde::Serializer>(sig: &Arc<Signature>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(sig.as_ref())
}
