use std::fmt;

/// Scalar types known to the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    String,
    Boolean,
    Number,
    Date,
    TestRecord,
    Test,
}

/// Single-parameter type constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericKind {
    List,
    Range,
    Maybe,
}

/// A query-language type. Equality is structural (derived), and overload resolution matches it
/// exactly: there is no widening or coercion anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicType),
    Generic(GenericKind, Box<Type>),
    /// Reserved for higher-order signatures; no builtin takes or returns one yet.
    Function(Vec<Type>),
}

pub static STRING: Type = Type::Basic(BasicType::String);
pub static BOOLEAN: Type = Type::Basic(BasicType::Boolean);
pub static NUMBER: Type = Type::Basic(BasicType::Number);
pub static DATE: Type = Type::Basic(BasicType::Date);
pub static TEST_RECORD: Type = Type::Basic(BasicType::TestRecord);
pub static TEST: Type = Type::Basic(BasicType::Test);

/// Deepest generic nesting the registry may declare (`List<Maybe<Test>>` is depth 2).
pub const MAX_GENERIC_DEPTH: usize = 2;

impl Type {
    pub fn list(inner: Type) -> Type {
        Type::Generic(GenericKind::List, Box::new(inner))
    }

    pub fn range(inner: Type) -> Type {
        Type::Generic(GenericKind::Range, Box::new(inner))
    }

    pub fn maybe(inner: Type) -> Type {
        Type::Generic(GenericKind::Maybe, Box::new(inner))
    }

    /// Generic nesting depth; basic types are 0.
    pub fn depth(&self) -> usize {
        match self {
            Type::Basic(_) => 0,
            Type::Generic(_, inner) => 1 + inner.depth(),
            Type::Function(types) => types.iter().map(Type::depth).max().unwrap_or(0),
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BasicType::String => "String",
            BasicType::Boolean => "Boolean",
            BasicType::Number => "Number",
            BasicType::Date => "Date",
            BasicType::TestRecord => "TestRecord",
            BasicType::Test => "Test",
        };
        f.write_str(name)
    }
}

impl fmt::Display for GenericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenericKind::List => "List",
            GenericKind::Range => "Range",
            GenericKind::Maybe => "Maybe",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(basic) => write!(f, "{basic}"),
            Type::Generic(outer, inner) => write!(f, "{outer}<{inner}>"),
            Type::Function(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" => ")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

impl serde::Serialize for Type {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        assert_eq!(Type::list(STRING.clone()), Type::list(STRING.clone()));
        assert_ne!(Type::list(STRING.clone()), Type::list(NUMBER.clone()));
        assert_ne!(Type::list(NUMBER.clone()), Type::range(NUMBER.clone()));
        assert_ne!(NUMBER, DATE);
    }

    #[test]
    fn nested_equality_recurses() {
        let a = Type::list(Type::maybe(TEST.clone()));
        let b = Type::list(Type::maybe(TEST.clone()));
        let c = Type::list(Type::maybe(TEST_RECORD.clone()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn no_widening_between_basic_and_generic() {
        assert_ne!(STRING, Type::list(STRING.clone()));
    }

    #[test]
    fn print_basic_and_generic() {
        assert_eq!(NUMBER.to_string(), "Number");
        assert_eq!(Type::list(STRING.clone()).to_string(), "List<String>");
        assert_eq!(Type::maybe(TEST.clone()).to_string(), "Maybe<Test>");
        assert_eq!(Type::list(Type::range(DATE.clone())).to_string(), "List<Range<Date>>");
    }

    #[test]
    fn print_function() {
        let f = Type::Function(vec![NUMBER.clone(), BOOLEAN.clone()]);
        assert_eq!(f.to_string(), "Number => Boolean");
    }

    #[test]
    fn depth() {
        assert_eq!(NUMBER.depth(), 0);
        assert_eq!(Type::list(STRING.clone()).depth(), 1);
        assert_eq!(Type::list(Type::maybe(TEST.clone())).depth(), 2);
    }

    #[test]
    fn serializes_as_printed_form() {
        let json = serde_json::to_string(&Type::range(DATE.clone())).unwrap();
        assert_eq!(json, r#""Range<Date>""#);
    }
}
