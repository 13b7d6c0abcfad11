//! Span information for source locations
//!
//! Provides precise source location tracking for error reporting.

use serde::{Deserialize, Serialize};

/// A position in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column (1-indexed, in bytes)
    pub column: usize,
    /// Byte offset (0-indexed)
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The position before the first byte of the source.
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

/// A source range delimited by a start and an end position.
///
/// Invariant: `end.offset >= start.offset`. Zero-width spans are produced
/// only for the sentinel EOF token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create an empty span at the origin.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Span covering everything from the start of `a` to the end of `b`.
    pub fn between(a: Span, b: Span) -> Span {
        Span {
            start: a.start,
            end: b.end,
        }
    }

    /// Merge two spans into one that covers both.
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
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset >= self.end.offset
    }

    /// Rebase a span produced from a sub-parse (e.g. an interpolation
    /// segment) onto its position within the enclosing source.
    pub fn rebased(&self, base: Position) -> Span {
        Span {
            start: rebase_position(self.start, base),
            end: rebase_position(self.end, base),
        }
    }
}

fn rebase_position(pos: Position, base: Position) -> Position {
    let line = base.line + pos.line - 1;
    let column = if pos.line == 1 {
        base.column + pos.column - 1
    } else {
        pos.column
    };
    Position {
        line,
        column,
        offset: base.offset + pos.offset,
    }
}

/// Maps byte offsets to full [`Position`]s.
///
/// Line boundaries are recorded once up front; each lookup then
/// binary-searches them, so building spans while lexing stays cheap.
#[derive(Debug, Clone)]
pub struct SourceMap {
    /// Byte offset of the first byte of every line. Never empty: line 1
    /// starts at offset 0 even for an empty source.
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|nl| nl + 1));
        Self { line_starts }
    }

    /// Build the position for a byte offset.
    pub fn position(&self, offset: usize) -> Position {
        // Index of the last line starting at or before the offset. The
        // partition point is at least 1 because line 1 starts at 0.
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            - 1;
        Position {
            line: line_idx + 1,
            column: offset - self.line_starts[line_idx] + 1,
            offset,
        }
    }

    /// Create a span with full position information from byte offsets.
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span {
            start: self.position(start),
            end: self.position(end),
        }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
