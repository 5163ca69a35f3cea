//! Error types for sc3ml-repair
//!
//! This module defines all error types used throughout the library.
//! Numeric coercion never produces an error: malformed numbers are replaced
//! by their defaults, so the variants here only cover conditions that stop a run.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for repair and inventory operations
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not exist
    #[error("input not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document could not be parsed as XML
    #[error("malformed XML: {0}")]
    MalformedXml(#[from] ParseError),

    /// A typed inventory value could not be converted
    #[error("value error: {0}")]
    Value(String),

    /// Reading, writing or decompressing a file failed
    #[error("resource error: {0}")]
    Resource(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// XML parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Byte offset in the decoded document, when known
    pub location: Option<usize>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the byte offset
    pub fn with_location(mut self, location: usize) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(loc) = self.location {
            write!(f, " (at byte {})", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
