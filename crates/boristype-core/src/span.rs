use std::fmt;

/// Byte range of a node in its source file, plus the 1-based position of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Span {
            start,
            end,
            line,
            column,
        }
    }

    /// Span for nodes synthesized by a pass
    pub fn dummy() -> Self {
        Span::default()
    }

    pub fn combine(&self, other: &Span) -> Span {
        if self.start <= other.start {
            Span {
                start: self.start,
                end: self.end.max(other.end),
                line: self.line,
                column: self.column,
            }
        } else {
            other.combine(self)
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
