//! GIMPLE Extractor - Common Types and Utilities
//!
//! This crate provides the error type, source locations and the extraction
//! configuration shared by every crate of the extractor.

pub mod config;
pub mod error;
pub mod source_loc;

pub use config::{DataFormat, ExtractConfig, DEFAULT_OUTPUT_PATH};
pub use error::{ExtractError, SkipReason};
pub use source_loc::SourceLocation;
