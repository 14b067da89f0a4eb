//! Read-only view of the vocabulary data the accessor builtins consult.
//!
//! The records mirror what the flashcard application stores (camelCase JSON). The engine only ever
//! borrows them; nothing here is mutated during evaluation.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::template;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Shift by a (possibly fractional) number of milliseconds, rounded to the nearest one.
    pub fn offset(self, millis: f64) -> Timestamp {
        Timestamp(self.0.saturating_add(millis.round() as i64))
    }

    /// Milliseconds from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> f64 {
        self.0 as f64 - earlier.0 as f64
    }

    pub fn now() -> Timestamp {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64);
        Timestamp(millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    #[default]
    Disp,
    Sub,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Meaning,
    Sentence,
    #[serde(other)]
    Other,
}

/// A note attached to a word. Sentences may be nested under other documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub kind: DocumentKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub docs: Vec<Document>,
}

/// One answered test question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub time: Timestamp,
    /// 0, 0.5 or 1.
    pub correct: f64,
    #[serde(default)]
    pub mode: TestMode,
    #[serde(default)]
    pub old_easiness: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub easiness: f64,
    pub test_after: Timestamp,
    pub create_time: Timestamp,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub half_correct_count: u32,
    #[serde(default)]
    pub test_rec: Vec<TestRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: u64,
    pub disp: String,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub docs: Vec<Document>,
    #[serde(default)]
    pub mem: Memory,
}

impl Word {
    /// Top-level meaning documents.
    pub fn meanings(&self) -> Vec<&str> {
        self.docs
            .iter()
            .filter(|doc| doc.kind == DocumentKind::Meaning)
            .map(|doc| doc.text.as_str())
            .collect()
    }

    /// Example sentence templates at any nesting depth, in document order. Word references are
    /// still in their `#id(text)` form; [`EvalContext::sentences`] renders them.
    pub fn sentence_templates(&self) -> Vec<&str> {
        fn collect<'w>(docs: &'w [Document], out: &mut Vec<&'w str>) {
            for doc in docs {
                if doc.kind == DocumentKind::Sentence {
                    out.push(&doc.text);
                } else {
                    collect(&doc.docs, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.docs, &mut out);
        out
    }
}

/// A stored test session: which words it asked and how well each was answered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: u64,
    #[serde(default)]
    pub create_time: Timestamp,
    #[serde(default)]
    pub access_time: Timestamp,
    #[serde(default)]
    pub mode: TestMode,
    pub word_ids: Vec<u64>,
    /// Correctness per position of `word_ids`; shorter than it while the test is unfinished.
    #[serde(default)]
    pub correctness: Vec<f64>,
    #[serde(default)]
    pub locked: bool,
}

impl Test {
    pub fn contains_word(&self, word_id: u64) -> bool {
        self.word_ids.contains(&word_id)
    }

    /// Recorded correctness for `word_id`, if the word is in the test and has been answered.
    pub fn correctness_of(&self, word_id: u64) -> Option<f64> {
        let index = self.word_ids.iter().position(|&id| id == word_id)?;
        self.correctness.get(index).copied()
    }
}

/// Everything a query can see while it evaluates one word.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub word: &'a Word,
    pub tests: &'a [Test],
    pub now: Timestamp,
    /// Words that sentence references may point at. Empty unless set with [`Self::with_words`].
    pub words: &'a [Word],
}

impl<'a> EvalContext<'a> {
    pub fn new(word: &'a Word, tests: &'a [Test], now: Timestamp) -> Self {
        EvalContext { word, tests, now, words: &[] }
    }

    pub fn with_words(self, words: &'a [Word]) -> Self {
        EvalContext { words, ..self }
    }

    /// Display text of word `id`, looked up among [`Self::words`].
    pub fn disp_of(&self, id: u64) -> Option<&'a str> {
        self.words.iter().find(|w| w.id == id).map(|w| w.disp.as_str())
    }

    /// The current word's sentences as a reader sees them, with `#id(text)` and `#id` references
    /// replaced by display text. A reference to a word outside [`Self::words`] stays `#id`.
    pub fn sentences(&self) -> Vec<Cow<'a, str>> {
        self.word
            .sentence_templates()
            .into_iter()
            .map(|text| template::render(text, |id| self.disp_of(id)))
            .collect()
    }
}

/// The JSON document the CLI reads: `{ "words": [...], "tests": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub words: Vec<Word>,
    #[serde(default)]
    pub tests: Vec<Test>,
}
