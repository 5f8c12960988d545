//! Error types for solvetrack-core

use thiserror::Error;

/// Main error type for the solvetrack-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown student id or handle
    #[error("not found: {0}")]
    NotFound(String),

    /// External stats source failed or timed out
    #[error("stats source unavailable for {handle}: {message}")]
    UpstreamUnavailable { handle: String, message: String },

    /// Input that fails structural parsing
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Stored data violates a uniqueness expectation
    #[error("inconsistent data: {0}")]
    Inconsistent(String),
}

impl Error {
    /// Whether this failure only affects one student and should be tallied
    /// rather than aborting a batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::UpstreamUnavailable { .. } | Error::MalformedInput(_)
        )
    }
}

/// Result type alias for solvetrack-core
pub type Result<T> = std::result::Result<T, Error>;
