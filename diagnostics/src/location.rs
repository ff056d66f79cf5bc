use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in the source text. `line` and `column` are 1-based, `offset` is
/// the 0-based byte offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The very first character of a document.
    pub fn start_of_file() -> Self {
        Self::new(1, 1, 0)
    }
}

/// A half-open span `[start, end)` in the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Location used for diagnostics that have no better anchor, such as
    /// errors in host-declared functions.
    pub fn start_of_file() -> Self {
        let pos = Position::start_of_file();
        Self::new(pos, pos)
    }

    /// The smallest span covering both `self` and `other`.
    pub fn join(&self, other: &SourceLocation) -> SourceLocation {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        SourceLocation { start, end }
    }

    /// Whether `line` falls within the lines this span touches.
    pub fn covers_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    /// The source text this span covers, if it is within bounds.
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start.offset..self.end.offset)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}
