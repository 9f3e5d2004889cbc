//! Byte-offset source locations.
//!
//! Every token, AST node and diagnostic carries a [`Span`] so errors can
//! point at the offending source text. Spans are byte offsets into the
//! source string, matching Rust's slicing semantics:
//! `&source[span.start..span.end]` is the spanned text.

/// A half-open byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Offset of the first byte (inclusive).
    pub start: usize,
    /// Offset one past the last byte (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a span from raw offsets. No validation is performed.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `pos`, used for fabricated nodes.
    pub fn point(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// The span of `a + b` is `a.span.merge(b.span)`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// 1-based line and column of `self.start` within `source`.
    ///
    /// Derived on demand; the compiler stores only byte offsets.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let upto = &source[..self.start.min(source.len())];
        let line = upto.bytes().filter(|&b| b == b'\n').count() + 1;
        let col = upto.rfind('\n').map_or(self.start + 1, |nl| self.start - nl);
        (line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stores_offsets() {
        let span = Span::new(3, 9);
        assert_eq!(span.start, 3);
        assert_eq!(span.end, 9);
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn point_is_empty() {
        assert!(Span::point(7).is_empty());
    }

    #[test]
    fn merge_covers_both_ranges() {
        let merged = Span::new(2, 5).merge(Span::new(4, 11));
        assert_eq!(merged, Span::new(2, 11));
    }

    #[test]
    fn merge_is_order_independent() {
        let a = Span::new(8, 10);
        let b = Span::new(0, 1);
        assert_eq!(a.merge(b), b.merge(a));
    }

    #[test]
    fn line_col_on_first_line() {
        let src = "val x = 1";
        assert_eq!(Span::new(4, 5).line_col(src), (1, 5));
    }

    #[test]
    fn line_col_after_newlines() {
        let src = "a\nbb\nccc";
        assert_eq!(Span::new(5, 6).line_col(src), (3, 1));
        assert_eq!(Span::new(7, 8).line_col(src), (3, 3));
    }
}
