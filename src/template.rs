//! Sentence templates. A sentence may reference other words: `#12(猫)` shows as `猫`, and a bare
//! `#12` shows as word 12's display text.

use std::borrow::Cow;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Segment {
    #[regex(r"#[0-9]*(\([^)]+\))?")]
    WordRef,
    #[regex(r"[^#]+")]
    Text,
}

/// A word reference split into its parts. Either may be absent: `#(猫)` has no id, `#12` no text.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WordRef<'t> {
    id: Option<u64>,
    disp: Option<&'t str>,
}

impl<'t> WordRef<'t> {
    fn parse(slice: &'t str) -> Self {
        let body = &slice[1..];
        let (digits, disp) = match body.find('(') {
            Some(open) => (&body[..open], body[open + 1..].strip_suffix(')')),
            None => (body, None),
        };
        WordRef { id: digits.parse().ok(), disp }
    }
}

/// Renders a template as the reader sees it. `lookup` finds the display text of a referenced word;
/// a reference that names no known word is left as `#id`. Templates without references are
/// returned borrowed.
pub fn render<'t>(template: &'t str, lookup: impl Fn(u64) -> Option<&'t str>) -> Cow<'t, str> {
    if !template.contains('#') {
        return Cow::Borrowed(template);
    }
    let mut out = String::with_capacity(template.len());
    let mut lex = Segment::lexer(template);
    while let Some(segment) = lex.next() {
        let slice = lex.slice();
        match segment {
            Ok(Segment::WordRef) => {
                let word = WordRef::parse(slice);
                match word.disp.or_else(|| word.id.and_then(&lookup)) {
                    Some(disp) => out.push_str(disp),
                    None => out.push_str(slice),
                }
            }
            Ok(Segment::Text) | Err(()) => out.push_str(slice),
        }
    }
    Cow::Owned(out)
}
