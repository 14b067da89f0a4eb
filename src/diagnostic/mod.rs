pub mod ansi;
pub mod json;
pub mod registry;

use crate::ast::Span;
use crate::{QueryError, StageError};

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: true });
        self
    }

    pub fn with_secondary_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: false });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<&QueryError> for Diagnostic {
    /// The first line of the message becomes the headline; overload listings and other
    /// continuation lines become notes.
    fn from(e: &QueryError) -> Self {
        let message = e.message();
        let mut lines = message.lines();
        let headline = lines.next().unwrap_or_default();

        let mut d = Diagnostic::error(headline)
            .with_code(e.code())
            .with_span(e.span(), primary_label(&e.error))
            .with_source(e.query.clone());
        for line in lines {
            d = d.with_note(line);
        }
        if let StageError::Parse(crate::parser::ParseError::ExpectedClosingParen { open, .. }) = &e.error {
            d = d.with_secondary_span(*open, "unclosed '(' opened here");
        }
        if let StageError::Lex(lex) = &e.error {
            if let Some(suggestion) = lex.suggestion() {
                d = d.with_suggestion(format!("did you mean '{suggestion}'?"));
            }
        }
        d.with_note(format!("rejected at the {} stage", e.stage()))
    }
}

fn primary_label(error: &StageError) -> &'static str {
    match error {
        StageError::Lex(_) => "not a token",
        StageError::Parse(_) => "here",
        StageError::Resolve(crate::resolve::ResolveError::RootTypeMismatch { .. }) => "query result",
        StageError::Resolve(_) => "in this call",
    }
}
