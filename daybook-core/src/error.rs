//! Error types for daybook.

use thiserror::Error;

/// Errors that can occur in daybook operations.
///
/// Malformed calendar content is never an error: the decoder reports it as
/// [`ParseIssue`](crate::ics::ParseIssue) diagnostics instead.
#[derive(Error, Debug)]
pub enum CalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Event not found: {0}")]
    EventNotFound(i64),
}

impl From<serde_json::Error> for CalError {
    fn from(err: serde_json::Error) -> Self {
        CalError::Serialization(err.to_string())
    }
}

/// Result type alias for daybook operations.
pub type CalResult<T> = Result<T, CalError>;
