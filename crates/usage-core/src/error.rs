//! Error types for usage-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in usage-core
#[derive(Debug, Error)]
pub enum Error {
    /// Leaderboard row with fewer than four `|`-delimited fields
    #[error("malformed leaderboard record on line {line}: '{content}'")]
    MalformedRecord { line: usize, content: String },

    /// Detailed entry without a trailing numeric percentage
    #[error("malformed entry '{content}': {reason}")]
    MalformedEntry { content: String, reason: String },

    /// Section label outside the known category set
    #[error("unknown category '{label}' for '{entity}'")]
    UnknownCategory { entity: String, label: String },

    /// Detailed report ended before the last block was closed
    #[error("entity '{entity}' is not followed by a closing separator")]
    UnterminatedEntity { entity: String },

    /// Markup text that the reader cannot make sense of
    #[error("malformed markup at byte {offset}: {message}")]
    MalformedMarkup { offset: usize, message: String },

    /// Element tree does not have the expected shape
    #[error("expected element <{expected}>, found <{found}>")]
    UnexpectedElement { expected: String, found: String },

    /// Two batch jobs writing the same file
    #[error("output '{0}' is targeted by more than one job")]
    DuplicateOutput(PathBuf),

    /// A batch job writing over one of the batch inputs
    #[error("output '{0}' is also read as an input")]
    OutputIsInput(PathBuf),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error from the csv crate
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed_entry(content: &str, reason: impl Into<String>) -> Self {
        Error::MalformedEntry {
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}
