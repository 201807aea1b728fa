//! Error types for the chronoscene library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for chronoscene operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// An ISO-8601 date string could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// An interval string or start/stop pair is not a valid interval
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// A reference string has the wrong arity or an empty path
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A packet attribute payload has an unknown or inconsistent shape
    #[error("Malformed packet '{id}', attribute '{attribute}': {reason}")]
    MalformedPacket {
        id: String,
        attribute: String,
        reason: String,
    },

    /// Value kind mismatch when adding samples or merging properties
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// An entity with this id already exists in the collection
    #[error("Duplicate entity id: {0}")]
    DuplicateId(String),

    /// Unsupported document version
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),

    /// A chain of reference properties loops back on itself
    #[error("Reference cycle detected while resolving: {0}")]
    ReferenceCycle(String),

    /// A load ticket was superseded by a newer load
    #[error("Load superseded: ticket {ticket} is older than generation {current}")]
    StaleLoad { ticket: u64, current: u64 },

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a malformed-packet error with context.
    pub fn malformed(
        id: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedPacket {
            id: id.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for chronoscene operations.
pub type Result<T> = std::result::Result<T, Error>;
