use std::borrow::Cow;
use std::fmt;

use crate::ast::Typed;
use crate::context::{EvalContext, Test, TestRecord, Timestamp};

/// A runtime value. Strings and records borrow from the evaluation context where they can.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Number(f64),
    String(Cow<'a, str>),
    Boolean(bool),
    Date(Timestamp),
    List(Vec<Value<'a>>),
    Range { start: Box<Value<'a>>, end: Box<Value<'a>> },
    Maybe(Option<Box<Value<'a>>>),
    TestRecord(&'a TestRecord),
    Test(&'a Test),
}

/// A resolved tree only ever hands a native body the shapes its signature declares.
#[cold]
fn mismatch(expected: &str, got: &Value<'_>) -> ! {
    unreachable!("resolved call received {got:?} where {expected} was declared")
}

impl<'a> Value<'a> {
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            other => mismatch("Number", other),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::String(s) => s,
            other => mismatch("String", other),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            other => mismatch("Boolean", other),
        }
    }

    pub fn as_date(&self) -> Timestamp {
        match self {
            Value::Date(t) => *t,
            other => mismatch("Date", other),
        }
    }

    pub fn as_list(&self) -> &[Value<'a>] {
        match self {
            Value::List(items) => items,
            other => mismatch("List", other),
        }
    }

    pub fn as_range(&self) -> (&Value<'a>, &Value<'a>) {
        match self {
            Value::Range { start, end } => (start, end),
            other => mismatch("Range", other),
        }
    }

    pub fn as_maybe(&self) -> Option<&Value<'a>> {
        match self {
            Value::Maybe(inner) => inner.as_deref(),
            other => mismatch("Maybe", other),
        }
    }

    pub fn as_test(&self) -> &'a Test {
        match self {
            Value::Test(test) => *test,
            other => mismatch("Test", other),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(t) => write!(f, "@{}", t.0),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Range { start, end } => write!(f, "{start}..{end}"),
            Value::Maybe(Some(v)) => write!(f, "~{v}"),
            Value::Maybe(None) => write!(f, "nothing"),
            Value::TestRecord(rec) => write!(f, "testRec(@{}, {})", rec.time.0, rec.correct),
            Value::Test(test) => write!(f, "test#{}", test.id),
        }
    }
}

/// Evaluates a resolved tree against one word. Arguments are evaluated left to right before the
/// call; nothing in the context is mutated, so one tree may be evaluated concurrently.
pub fn evaluate<'a>(node: &Typed, ctx: &EvalContext<'a>) -> Value<'a> {
    match node {
        Typed::Number { value, .. } => Value::Number(*value),
        Typed::String { value, .. } => Value::String(Cow::Owned(value.clone())),
        Typed::Call { args, signature, .. } => {
            let values = args.iter().map(|arg| evaluate(arg, ctx)).collect();
            signature.call(ctx, values)
        }
    }
}
