use botlang_parser::SyntaxError;
use diagnostics::{render_snippet, SourceLocation};
use thiserror::Error;

/// The one error kind `compile` reports. Checking stops at the first problem.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    pub location: SourceLocation,
}

impl CompileError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    /// Problems in host declarations have no place in the program text and
    /// are reported at 1:1.
    pub fn at_start(message: impl Into<String>) -> Self {
        Self::new(message, SourceLocation::start_of_file())
    }

    /// The message with the offending source line and a caret underneath.
    pub fn render(&self, source: &str) -> String {
        render_snippet(source, &self.location, &self.message)
    }
}

impl From<SyntaxError> for CompileError {
    fn from(err: SyntaxError) -> Self {
        Self {
            message: err.message(),
            location: err.location,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
