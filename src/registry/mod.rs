//! The builtin function library.
//!
//! Every name a query can mention is a [`Builtin`], fixed at lex time. Each builtin owns an ordered
//! list of [`Signature`]s; the resolver picks the single one whose parameter types equal the
//! argument types, and the typed tree keeps a handle to it so evaluation never looks names up.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::ast::Precedence;
use crate::context::EvalContext;
use crate::interpreter::Value;
use crate::types::Type;

mod builtins;
pub mod kana;

/// Identifies one builtin function. Symbolic and word spellings of the same operator
/// (`&` and `and`) map to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Contains,
    StartsWith,
    EndsWith,
    Kana,
    Empty,
    LengthOf,
    TestIndex,
    True,
    False,
    Now,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Range,
    In,
    And,
    Or,
    Not,
    Add,
    Subtract,
    Multiply,
    Divide,
    Easiness,
    Text,
    Disp,
    Sub,
    Meaning,
    Sentence,
    Doc,
    Hour,
    Day,
    Month,
    Year,
    Testable,
    CreateTime,
    NextTestTime,
    Correct,
    HalfCorrect,
    Wrong,
    TestRec,
    Tests,
    InTest,
}

impl Builtin {
    /// Every builtin, in declaration order. `ALL[b as usize] == b`.
    pub const ALL: &'static [Builtin] = &[
        Builtin::Contains,
        Builtin::StartsWith,
        Builtin::EndsWith,
        Builtin::Kana,
        Builtin::Empty,
        Builtin::LengthOf,
        Builtin::TestIndex,
        Builtin::True,
        Builtin::False,
        Builtin::Now,
        Builtin::Eq,
        Builtin::Ne,
        Builtin::Lt,
        Builtin::Gt,
        Builtin::Le,
        Builtin::Ge,
        Builtin::Range,
        Builtin::In,
        Builtin::And,
        Builtin::Or,
        Builtin::Not,
        Builtin::Add,
        Builtin::Subtract,
        Builtin::Multiply,
        Builtin::Divide,
        Builtin::Easiness,
        Builtin::Text,
        Builtin::Disp,
        Builtin::Sub,
        Builtin::Meaning,
        Builtin::Sentence,
        Builtin::Doc,
        Builtin::Hour,
        Builtin::Day,
        Builtin::Month,
        Builtin::Year,
        Builtin::Testable,
        Builtin::CreateTime,
        Builtin::NextTestTime,
        Builtin::Correct,
        Builtin::HalfCorrect,
        Builtin::Wrong,
        Builtin::TestRec,
        Builtin::Tests,
        Builtin::InTest,
    ];

    /// Symbolic spelling, for builtins usable as infix operators.
    pub fn symbol(self) -> Option<&'static str> {
        let s = match self {
            Builtin::Contains => "->",
            Builtin::StartsWith => "->^",
            Builtin::EndsWith => "->$",
            Builtin::TestIndex => "#",
            Builtin::Eq => "==",
            Builtin::Ne => "!=",
            Builtin::Lt => "<",
            Builtin::Gt => ">",
            Builtin::Le => "<=",
            Builtin::Ge => ">=",
            Builtin::Range => "..",
            Builtin::In => "<-",
            Builtin::And => "&",
            Builtin::Or => "|",
            Builtin::Not => "!",
            Builtin::Add => "+",
            Builtin::Subtract => "-",
            Builtin::Multiply => "*",
            Builtin::Divide => "/",
            _ => return None,
        };
        Some(s)
    }

    /// Identifier spelling. Operators with a word alias lex as operators either way.
    pub fn word(self) -> Option<&'static str> {
        let w = match self {
            Builtin::Contains => "contains",
            Builtin::StartsWith => "startswith",
            Builtin::EndsWith => "endswith",
            Builtin::Kana => "kana",
            Builtin::Empty => "empty",
            Builtin::LengthOf => "lengthOf",
            Builtin::True => "true",
            Builtin::False => "false",
            Builtin::Now => "now",
            Builtin::Eq => "equals",
            Builtin::In => "in",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Not => "not",
            Builtin::Easiness => "easiness",
            Builtin::Text => "text",
            Builtin::Disp => "disp",
            Builtin::Sub => "sub",
            Builtin::Meaning => "meaning",
            Builtin::Sentence => "sentence",
            Builtin::Doc => "doc",
            Builtin::Hour => "hour",
            Builtin::Day => "day",
            Builtin::Month => "month",
            Builtin::Year => "year",
            Builtin::Testable => "testable",
            Builtin::CreateTime => "createTime",
            Builtin::NextTestTime => "nextTestTime",
            Builtin::Correct => "correct",
            Builtin::HalfCorrect => "halfCorrect",
            Builtin::Wrong => "wrong",
            Builtin::TestRec => "testRec",
            Builtin::Tests => "tests",
            Builtin::InTest => "inTest",
            _ => return None,
        };
        Some(w)
    }

    /// Canonical name: the word spelling when there is one, else the symbol.
    pub fn name(self) -> &'static str {
        match (self.word(), self.symbol()) {
            (Some(word), _) => word,
            (None, Some(symbol)) => symbol,
            // every builtin has at least one spelling; checked by tests
            (None, None) => "?",
        }
    }

    /// Binding strength when used infix. `None` for builtins that only have a word spelling.
    pub fn precedence(self) -> Option<Precedence> {
        let p = match self {
            Builtin::Or => 3,
            Builtin::And => 4,
            Builtin::Lt
            | Builtin::Gt
            | Builtin::Le
            | Builtin::Ge
            | Builtin::In
            | Builtin::Contains
            | Builtin::StartsWith
            | Builtin::EndsWith => 5,
            Builtin::Eq | Builtin::Ne => 6,
            Builtin::Range => 7,
            Builtin::Add | Builtin::Subtract => 8,
            Builtin::Multiply | Builtin::Divide => 9,
            Builtin::TestIndex => 10,
            Builtin::Not => 11,
            _ => return None,
        };
        Some(p)
    }

    pub fn from_symbol(text: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.symbol() == Some(text))
    }

    pub fn from_word(text: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.word() == Some(text))
    }

    /// Every accepted spelling, symbols and words alike.
    pub fn spellings() -> impl Iterator<Item = &'static str> {
        Builtin::ALL.iter().flat_map(|b| b.symbol().into_iter().chain(b.word()))
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for Builtin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Native implementation of a signature. Argument values arrive already evaluated and in the
/// shapes the parameter types promise.
pub type NativeFn = Box<dyn for<'a> Fn(&EvalContext<'a>, Vec<Value<'a>>) -> Value<'a> + Send + Sync>;

/// One callable shape of a builtin.
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
    body: NativeFn,
}

impl Signature {
    pub fn new<F>(params: Vec<Type>, ret: Type, body: F) -> Self
    where
        F: for<'a> Fn(&EvalContext<'a>, Vec<Value<'a>>) -> Value<'a> + Send + Sync + 'static,
    {
        Signature { params, ret, body: Box::new(body) }
    }

    /// Exact structural match of parameter types against argument types.
    pub fn accepts(&self, args: &[&Type]) -> bool {
        self.params.len() == args.len() && self.params.iter().zip(args).all(|(param, arg)| param == *arg)
    }

    pub fn call<'a>(&self, ctx: &EvalContext<'a>, args: Vec<Value<'a>>) -> Value<'a> {
        (self.body)(ctx, args)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("params", &self.params)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

/// `Number => Number => Number`; a zero-parameter signature prints as its return type alone.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for param in &self.params {
            write!(f, "{param} => ")?;
        }
        write!(f, "{}", self.ret)
    }
}

/// A builtin together with its overloads, in declaration order.
#[derive(Debug)]
pub struct FunctionDef {
    pub builtin: Builtin,
    pub signatures: Vec<Arc<Signature>>,
}

impl FunctionDef {
    /// Signatures whose parameters exactly match `args`.
    pub fn matching<'s>(&'s self, args: &'s [&'s Type]) -> impl Iterator<Item = &'s Arc<Signature>> + 's {
        self.signatures.iter().filter(move |sig| sig.accepts(args))
    }
}

/// Read-only table of every builtin's definition.
#[derive(Debug)]
pub struct Registry {
    functions: Vec<FunctionDef>,
}

static STANDARD: LazyLock<Registry> = LazyLock::new(builtins::standard);

impl Registry {
    /// The process-wide standard library, built on first use.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    pub fn function(&self, builtin: Builtin) -> &FunctionDef {
        &self.functions[builtin as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> {
        self.functions.iter()
    }
}

/// Collects signatures per builtin, then lays them out in [`Builtin::ALL`] order.
pub(crate) struct RegistryBuilder {
    table: Vec<Vec<Arc<Signature>>>,
}

impl RegistryBuilder {
    pub(crate) fn new() -> Self {
        RegistryBuilder { table: vec![Vec::new(); Builtin::ALL.len()] }
    }

    pub(crate) fn define(&mut self, builtin: Builtin, signature: Signature) -> &mut Self {
        self.table[builtin as usize].push(Arc::new(signature));
        self
    }

    pub(crate) fn build(self) -> Registry {
        let functions = Builtin::ALL
            .iter()
            .zip(self.table)
            .map(|(&builtin, signatures)| FunctionDef { builtin, signatures })
            .collect();
        Registry { functions }
    }
}
