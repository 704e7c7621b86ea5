//! Byte ranges into expression and template source text.

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at the end of `source`.
    pub fn eof(source: &str) -> Self {
        Self::new(source.len(), source.len())
    }

    /// Span covering both spans.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The covered slice of `source`, if the span is in bounds.
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start..self.end)
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// 1-based line and column of a byte offset.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Render a caret diagnostic pointing at `span` in `source`.
pub fn render_diagnostic(source: &str, span: Span, message: &str, hint: Option<&str>) -> String {
    let (line, col) = offset_to_line_col(source, span.start);
    let mut out = format!("error: {}\n  --> line {}:{}\n", message, line, col);

    if let Some(source_line) = source.lines().nth(line - 1) {
        out.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
        out.push_str(&" ".repeat(col));
        out.push('^');
        let width = span.end.saturating_sub(span.start);
        let room = source_line.len().saturating_sub(col - 1);
        if width > 1 {
            out.push_str(&"~".repeat(width.min(room).saturating_sub(1)));
        }
        out.push('\n');
    }

    if let Some(hint) = hint {
        out.push_str(&format!("   = hint: {}\n", hint));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "a = 1\nand b = 2";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 6), (2, 1));
        assert_eq!(offset_to_line_col(source, 10), (2, 5));
    }

    #[test]
    fn test_diagnostic_points_at_span() {
        let out = render_diagnostic("name = = 1", Span::new(7, 8), "unexpected '='", None);
        assert!(out.contains("line 1:8"));
        assert!(out.contains("name = = 1"));
        assert!(out.ends_with("^\n"));
    }
}
