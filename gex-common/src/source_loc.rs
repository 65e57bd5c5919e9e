//! Source locations reported by the host compiler

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based, 0 means unknown)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// `file:line`, the form used for phi argument locations.
    pub fn file_line(&self) -> String {
        format!("{}:{}", self.filename, self.line)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}
