//! Error handling for the GIMPLE extractor
//!
//! Only faults live in [`ExtractError`]. Functions that are simply not
//! extracted (no source file, outside the source root) are reported through
//! [`SkipReason`], which callers log and move past.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Main extractor error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to encode {format} output: {message}")]
    Encode { format: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid host snapshot: {message}")]
    Snapshot { message: String },

    #[error("Host IR invariant violated: {message}")]
    Invariant { message: String },
}

impl ExtractError {
    pub fn io(path: impl AsRef<Path>, err: &std::io::Error) -> Self {
        ExtractError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn encode(format: impl fmt::Display, message: impl fmt::Display) -> Self {
        ExtractError::Encode {
            format: format.to_string(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ExtractError::Config {
            message: message.into(),
        }
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        ExtractError::Snapshot {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        ExtractError::Invariant {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io {
            path: "<unknown>".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<String> for ExtractError {
    fn from(message: String) -> Self {
        ExtractError::Invariant { message }
    }
}

/// Why a function produced no output. Not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The host could not attribute any source file to the function.
    NoSourceFile,
    /// The source file does not resolve to a path under the source root.
    OutOfScope { filename: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoSourceFile => write!(f, "no source file"),
            SkipReason::OutOfScope { filename } => {
                write!(f, "{} is outside the source root", filename)
            }
        }
    }
}
