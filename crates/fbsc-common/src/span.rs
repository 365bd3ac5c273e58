use std::ops::Range;

/// Source position within a schema file (1-based line/column, 0-based byte offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// A range in a schema file, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// Span for nodes that have no source text (tests, synthesized fields).
    pub fn dummy() -> Self {
        Self {
            file: String::new(),
            start: Position::default(),
            end: Position::default(),
        }
    }

    /// Smallest span covering both `self` and `other` (same file assumed).
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Span {
            file: self.file.clone(),
            start,
            end,
        }
    }

    /// Byte range, widened to at least one byte so it can always be labelled.
    pub fn byte_range(&self) -> Range<usize> {
        let start = self.start.offset as usize;
        let end = (self.end.offset as usize).max(start + 1);
        start..end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start.line, self.start.column)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: u32) -> Position {
        Position {
            line: 1,
            column: offset + 1,
            offset,
        }
    }

    #[test]
    fn merge_covers_both() {
        let a = Span::new("a.fbs", pos(4), pos(8));
        let b = Span::new("a.fbs", pos(1), pos(5));
        let m = a.merge(&b);
        assert_eq!(m.start.offset, 1);
        assert_eq!(m.end.offset, 8);
    }

    #[test]
    fn empty_span_has_one_byte_range() {
        let s = Span::new("a.fbs", pos(3), pos(3));
        assert_eq!(s.byte_range(), 3..4);
    }
}
