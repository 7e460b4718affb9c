//! Error types for pesticide-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for pesticide-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error at line {line_number}: {source}")]
    Json {
        /// The 1-based line number of the offending record (0 when writing).
        line_number: usize,
        /// The underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// A line was not valid UTF-8.
    #[error("Invalid UTF-8 at line {0}")]
    InvalidUtf8(usize),
}

/// A specialized Result type for pesticide-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
