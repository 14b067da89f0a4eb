/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one line, for listings
    pub long: &'static str,  // full explanation for --explain
}

/// All stable error codes a query can fail with.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Tokenize ────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "VQ-L001",
        short: "unknown operator",
        long: r#"## VQ-L001: unknown operator

A run of symbol characters (`- = < > ~ ^ $ [ ] & | ! # + * / .`) does not
spell any operator. Symbols are read greedily, so two operators written
without a space between them form one unknown operator.

**Example:**

    easiness >-1

`>-` is not an operator. Separate the two:

    easiness > -1
"#,
    },
    ErrorEntry {
        code: "VQ-L002",
        short: "unknown function",
        long: r#"## VQ-L002: unknown function

An identifier does not name a builtin. Names are case-sensitive.

**Example:**

    contains Disp 'cat'

**Fix:**

    contains disp 'cat'

Run `vocab-query --functions` to list every builtin with its signatures.
"#,
    },
    ErrorEntry {
        code: "VQ-L003",
        short: "string not ended",
        long: r#"## VQ-L003: string not ended

A string literal opened with `'` or `"` has no matching closing quote.
The error covers everything from the opening quote to the end of the query.

**Example:**

    disp -> 'cat

**Fix:**

    disp -> 'cat'

Inside a string, `\` escapes the next character: `'it\'s'`, `'a\\b'`.
`\n` is a newline.
"#,
    },
    ErrorEntry {
        code: "VQ-L004",
        short: "unexpected character",
        long: r#"## VQ-L004: unexpected character

A character cannot start any token. Text outside quotes may only contain
ASCII letters, digits, operator symbols, parentheses and whitespace.

**Example:**

    disp -> 猫

**Fix:** quote the text.

    disp -> '猫'
"#,
    },
    // ── Parse ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "VQ-P001",
        short: "unexpected token",
        long: r#"## VQ-P001: unexpected token

A token appeared where the grammar cannot use it: a `)` with no open `(`,
or an empty `()` with no function before it.

**Examples:**

    testable)
    () & testable

`f()` is accepted and means the same as `f`.
"#,
    },
    ErrorEntry {
        code: "VQ-P002",
        short: "operator without right operand",
        long: r#"## VQ-P002: operator without right operand

An infix operator ends the query or a parenthesized group.

**Example:**

    disp -> 'a' &

**Fix:** give the operator its right-hand side, or remove it.

    disp -> 'a' & testable
"#,
    },
    ErrorEntry {
        code: "VQ-P003",
        short: "unclosed parenthesis",
        long: r#"## VQ-P003: unclosed parenthesis

The query ended while a `(` was still open.

**Example:**

    contains text (kana 'neko'

**Fix:**

    contains text (kana 'neko')
"#,
    },
    ErrorEntry {
        code: "VQ-P004",
        short: "expression nested too deeply",
        long: r#"## VQ-P004: expression nested too deeply

A query may nest at most 128 levels, counting parentheses as well as
operators and applications chained one after another. Queries written by
hand stay far below this; generated queries that chain thousands of terms
hit it.

**Example:** one `+` per term, repeated a few hundred times.

    1 + 1 + 1 + 1 + ... + 1

**Fix:** group the chain with parentheses so each side stays shallow, or
split it into separate queries.
"#,
    },
    // ── Postproc ────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "VQ-T001",
        short: "no matching signature",
        long: r#"## VQ-T001: no matching signature

The argument types of a call match none of the function's signatures.
Types must match exactly; nothing is converted implicitly. The message
lists every signature the function has.

**Example:**

    disp -> 1

`contains` takes `List<String> => String` or `String => String`, not a
Number. Quote the text:

    disp -> '1'

Too few arguments is the same error: `kana` on its own has no
zero-argument signature.
"#,
    },
    ErrorEntry {
        code: "VQ-T002",
        short: "ambiguous signature",
        long: r#"## VQ-T002: ambiguous signature

More than one signature of a function accepts the argument types. The
matching signatures are marked with `!` in the listing. The standard
library never declares two overloads with the same parameters, so this
only occurs with custom registries.
"#,
    },
    ErrorEntry {
        code: "VQ-T003",
        short: "not callable",
        long: r#"## VQ-T003: not callable

Writing two expressions side by side applies the first to the second,
so the first must be a function name.

**Example:**

    'cat' 'dog'
    (easiness + 1) 2

Put an operator between them:

    'cat' == 'dog'
"#,
    },
    ErrorEntry {
        code: "VQ-T004",
        short: "query is not Boolean",
        long: r#"## VQ-T004: query is not Boolean

A filter query must produce a Boolean, but this one produces another type.

**Example:**

    easiness

**Fix:** compare the value with something.

    easiness < 2.5

With `--any-type` the CLI accepts queries of any type and prints their
value for each word instead of filtering.
"#,
    },
];

/// Look up an error entry by code (e.g. `"VQ-T001"`). Case-insensitive.
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code.eq_ignore_ascii_case(code))
}
