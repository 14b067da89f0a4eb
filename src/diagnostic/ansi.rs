use super::Diagnostic;
use crate::ast::SourceMap;

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn bold(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold_red(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1;31m{s}\x1b[0m") } else { s.to_string() }
    }

    fn cyan(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[36m{s}\x1b[0m") } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[2m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[VQ-L002]: message"
        let heading = match d.code {
            Some(code) => format!("error[{code}]"),
            None => "error".to_string(),
        };
        out.push_str(&format!("{}: {}\n", self.bold_red(&heading), self.bold(&d.message)));

        let primary = d.labels.iter().find(|l| l.is_primary);
        if let (Some(label), Some(source)) = (primary, &d.source) {
            let map = SourceMap::new(source);
            let (line, col) = map.lookup(source, label.span.start);
            let line_text = map.line_text(source, line);

            out.push_str(&format!("  {} {}:{}\n", self.cyan("-->"), line, col));

            let gutter = line.to_string().len();
            let pipe = self.cyan("|");
            let pad = " ".repeat(gutter);

            out.push_str(&format!("{pad} {pipe}\n"));
            let line_num = self.cyan(&format!("{line:>gutter$}"));
            out.push_str(&format!("{line_num} {pipe} {line_text}\n"));

            // Carets are counted in characters and stop at the end of the line.
            let (end_line, end_col) = map.lookup(source, label.span.end);
            let end_col = if end_line == line { end_col } else { line_text.chars().count() + 1 };
            let width = end_col.saturating_sub(col).max(1);
            let carets = self.bold_red(&"^".repeat(width));
            let indent = " ".repeat(col.saturating_sub(1));
            if label.message.is_empty() {
                out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
            } else {
                out.push_str(&format!("{pad} {pipe} {indent}{carets} {}\n", self.bold_red(&label.message)));
            }
            out.push_str(&format!("{pad} {pipe}\n"));
        }

        for label in d.labels.iter().filter(|l| !l.is_primary) {
            if label.message.is_empty() {
                continue;
            }
            match &d.source {
                Some(source) => {
                    let (line, col) = SourceMap::new(source).lookup(source, label.span.start);
                    out.push_str(&format!("  {} {} ({line}:{col})\n", self.dim("="), label.message));
                }
                None => out.push_str(&format!("  {} {}\n", self.dim("="), label.message)),
            }
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }

        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} help: {}\n", self.dim("="), suggestion));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn make_diag(source: &str, start: usize, end: usize) -> Diagnostic {
        Diagnostic::error("Unknown function 'dsp'.")
            .with_code("VQ-L002")
            .with_span(Span { start, end }, "not a token")
            .with_source(source.to_string())
            .with_note("rejected at the Tokenize stage")
            .with_suggestion("did you mean 'disp'?")
    }

    fn plain(d: &Diagnostic) -> String {
        AnsiRenderer { use_color: false }.render(d)
    }

    #[test]
    fn render_heading_with_code() {
        let out = plain(&make_diag("contains dsp 'x'", 9, 12));
        assert!(out.starts_with("error[VQ-L002]: Unknown function 'dsp'.\n"), "{out}");
    }

    #[test]
    fn render_contains_location_and_source() {
        let out = plain(&make_diag("contains dsp 'x'", 9, 12));
        assert!(out.contains("--> 1:10"), "missing location in:\n{out}");
        assert!(out.contains("1 | contains dsp 'x'"), "missing source line in:\n{out}");
    }

    #[test]
    fn carets_sit_under_span() {
        let out = plain(&make_diag("contains dsp 'x'", 9, 12));
        assert!(out.contains(&format!("  | {}^^^ not a token", " ".repeat(9))), "{out}");
    }

    #[test]
    fn carets_count_characters() {
        let out = plain(&make_diag("disp -> '猫猫' & x", 8, 16));
        assert!(out.contains(&format!("  | {}^^^^ ", " ".repeat(8))), "{out}");
    }

    #[test]
    fn empty_span_gets_one_caret() {
        let out = plain(&make_diag("(disp", 5, 5));
        assert!(out.contains(&format!("  | {}^ ", " ".repeat(5))), "{out}");
    }

    #[test]
    fn render_notes_and_help() {
        let out = plain(&make_diag("contains dsp 'x'", 9, 12));
        assert!(out.contains("= note: rejected at the Tokenize stage"), "{out}");
        assert!(out.contains("= help: did you mean 'disp'?"), "{out}");
    }

    #[test]
    fn secondary_labels_show_position() {
        let d = Diagnostic::error("Expect ')' to close '(', but got end of input.")
            .with_span(Span::at(5), "here")
            .with_secondary_span(Span::new(0, 1), "unclosed '(' opened here")
            .with_source("(disp");
        let out = plain(&d);
        assert!(out.contains("= unclosed '(' opened here (1:1)"), "{out}");
    }

    #[test]
    fn multiline_query_reports_right_line() {
        let source = "testable\n& dsp";
        let d = Diagnostic::error("bad").with_span(Span { start: 11, end: 14 }, "here").with_source(source);
        let out = plain(&d);
        assert!(out.contains("--> 2:3"), "expected line 2 in:\n{out}");
        assert!(out.contains("2 | & dsp"), "expected second line in:\n{out}");
    }

    #[test]
    fn no_source_no_snippet() {
        let out = plain(&Diagnostic::error("something bad"));
        assert_eq!(out, "error: something bad\n");
    }

    #[test]
    fn color_toggles_escape_codes() {
        let d = make_diag("contains dsp 'x'", 9, 12);
        assert!(AnsiRenderer { use_color: true }.render(&d).contains("\x1b["));
        assert!(!plain(&d).contains("\x1b["));
    }
}
