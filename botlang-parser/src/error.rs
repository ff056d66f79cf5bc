/// Syntax error with source location.
use std::fmt;

use diagnostics::SourceLocation;

/// The parser's single diagnostic: every token description that would have
/// been accepted at the furthest position it reached, and what it found
/// there instead.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxError {
    /// Sorted, de-duplicated descriptions such as `"end"` or `an identifier`.
    pub expected: Vec<String>,
    pub found: String,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn new(expected: Vec<String>, found: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            expected,
            found: found.into(),
            location,
        }
    }

    /// `Expected "end", "xor" or an identifier but "foo" found.`
    pub fn message(&self) -> String {
        match self.expected.as_slice() {
            [] => format!("Unexpected {}.", self.found),
            [only] => format!("Expected {} but {} found.", only, self.found),
            [init @ .., last] => format!(
                "Expected {} or {} but {} found.",
                init.join(", "),
                last,
                self.found
            ),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {}, col {}: {}",
            self.location.start.line,
            self.location.start.column,
            self.message()
        )
    }
}

impl std::error::Error for SyntaxError {}
