/// Maps byte offsets in a query to line/column positions. Queries are usually one line, but the
/// lexer accepts newlines as whitespace, so diagnostics still need real line numbers.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { line_starts }
    }

    fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Returns (line, col), both 1-based. `col` counts characters, not bytes, so carets line up
    /// under multi-byte text.
    pub fn lookup(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = self.line_index(offset);
        let start = self.line_starts[line];
        let end = offset.min(source.len()).max(start);
        let col = source.get(start..end).map_or(end - start, |s| s.chars().count());
        (line + 1, col + 1)
    }

    /// Returns the full text of the given 1-based line number.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        source[start..end].trim_end_matches('\n').trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let src = "contains disp 'x'";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(src, 0), (1, 1));
        assert_eq!(sm.lookup(src, 9), (1, 10));
        assert_eq!(sm.lookup(src, src.len()), (1, 18));
    }

    #[test]
    fn multi_line() {
        let src = "testable\n& easiness > 2";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(src, 0), (1, 1));
        assert_eq!(sm.lookup(src, 8), (1, 9)); // the newline itself
        assert_eq!(sm.lookup(src, 9), (2, 1));
        assert_eq!(sm.lookup(src, 11), (2, 3));
    }

    #[test]
    fn columns_count_chars_not_bytes() {
        let src = "disp -> '猫' | x";
        let sm = SourceMap::new(src);
        let pipe = src.find('|').unwrap();
        // '猫' is three bytes but one column
        assert_eq!(sm.lookup(src, pipe), (1, 13));
    }

    #[test]
    fn line_text_multi() {
        let src = "testable\n& true\n| false";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "testable");
        assert_eq!(sm.line_text(src, 2), "& true");
        assert_eq!(sm.line_text(src, 3), "| false");
    }

    #[test]
    fn line_text_out_of_bounds() {
        let src = "true";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 0), "");
        assert_eq!(sm.line_text(src, 99), "");
    }

    #[test]
    fn empty_source() {
        let sm = SourceMap::new("");
        assert_eq!(sm.lookup("", 0), (1, 1));
        assert_eq!(sm.line_text("", 1), "");
    }

    #[test]
    fn crlf_trimmed() {
        let src = "true\r\n| false";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "true");
    }
}
