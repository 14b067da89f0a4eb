use crate::ast::Typed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtMode {
    /// One line: `(or (contains text 'x') (contains text (kana 'x')))`.
    /// The output is itself a valid query that resolves to the same tree.
    Dense,
    /// Calls with nested calls break their arguments onto indented lines.
    Expanded,
}

const INDENT: &str = "  ";

pub fn format(node: &Typed, mode: FmtMode) -> String {
    let mut out = String::new();
    match mode {
        FmtMode::Dense => fmt_dense(&mut out, node),
        FmtMode::Expanded => fmt_expanded(&mut out, node, 0),
    }
    out
}

fn fmt_dense(out: &mut String, node: &Typed) {
    match node {
        Typed::Number { value, .. } => out.push_str(&fmt_num(*value)),
        Typed::String { value, .. } => out.push_str(&quote(value)),
        Typed::Call { function, args, .. } if args.is_empty() => out.push_str(function.name()),
        Typed::Call { function, args, .. } => {
            out.push('(');
            out.push_str(function.name());
            for arg in args {
                out.push(' ');
                fmt_dense(out, arg);
            }
            out.push(')');
        }
    }
}

fn fmt_expanded(out: &mut String, node: &Typed, level: usize) {
    let Typed::Call { function, args, .. } = node else {
        return fmt_dense(out, node);
    };
    if !args.iter().any(has_arguments) {
        return fmt_dense(out, node);
    }
    out.push('(');
    out.push_str(function.name());
    for arg in args {
        out.push('\n');
        out.push_str(&INDENT.repeat(level + 1));
        fmt_expanded(out, arg, level + 1);
    }
    out.push(')');
}

fn has_arguments(node: &Typed) -> bool {
    matches!(node, Typed::Call { args, .. } if !args.is_empty())
}

fn fmt_num(n: f64) -> String {
    if n == (n as i64) as f64 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Single-quoted string literal as the lexer reads it back.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompileOptions, compile};

    fn typed(source: &str) -> Typed {
        match compile(source, CompileOptions { expect_boolean: false, ..CompileOptions::default() }) {
            Ok(crate::Compiled::Query(query)) => query.root,
            other => panic!("{source:?} did not compile: {other:?}"),
        }
    }

    fn dense(source: &str) -> String {
        format(&typed(source), FmtMode::Dense)
    }

    fn expanded(source: &str) -> String {
        format(&typed(source), FmtMode::Expanded)
    }

    fn assert_round_trip(source: &str) {
        let formatted = dense(source);
        let again = dense(&formatted);
        assert_eq!(formatted, again, "round-trip mismatch\n  original:  {source}\n  formatted: {formatted}");
    }

    #[test]
    fn literals() {
        assert_eq!(dense("42"), "42");
        assert_eq!(dense("2.5"), "2.5");
        assert_eq!(dense("'cat'"), "'cat'");
    }

    #[test]
    fn zero_argument_calls_print_bare() {
        assert_eq!(dense("now()"), "now");
        assert_eq!(dense("testable"), "testable");
    }

    #[test]
    fn infix_and_juxtaposition_print_alike() {
        assert_eq!(dense("disp -> 'x'"), "(contains disp 'x')");
        assert_eq!(dense("contains disp 'x'"), "(contains disp 'x')");
        assert_eq!(dense("1 + 2 * 3"), "(+ 1 (* 2 3))");
    }

    #[test]
    fn connectives_use_word_names() {
        assert_eq!(dense("testable & ! false"), "(and testable (not false))");
        assert_eq!(dense("easiness <- 1 .. 2"), "(in easiness (.. 1 2))");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"a\b"), r"'a\\b'");
        assert_eq!(dense(r"disp == 'it\'s'"), r"(equals disp 'it\'s')");
    }

    #[test]
    fn expanded_breaks_nested_calls() {
        assert_eq!(expanded("disp -> 'x'"), "(contains disp 'x')");
        assert_eq!(
            expanded("text -> 'x' | text -> (kana 'x')"),
            "(or\n  (contains text 'x')\n  (contains\n    text\n    (kana 'x')))"
        );
    }

    #[test]
    fn dense_output_round_trips() {
        assert_round_trip("contains disp 'x' & contains sub 'y' | contains meaning 'z'");
        assert_round_trip("now - createTime > day 3");
        assert_round_trip("inTest (tests # 2) halfCorrect");
        assert_round_trip("easiness > -1");
        assert_round_trip(r"disp ->^ 'a\'b'");
    }
}
