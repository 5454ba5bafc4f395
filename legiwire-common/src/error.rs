//! Common error types for legiwire

use thiserror::Error;

/// Common result type for legiwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the legiwire workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error (fatal for the run)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested session id is unknown to the metadata service
    #[error("Invalid session '{requested}' for {locality}; active sessions: {}", .suggestions.join(", "))]
    InvalidSession {
        locality: String,
        requested: String,
        suggestions: Vec<String>,
    },

    /// Bill identifier failed the normalization grammar
    #[error(transparent)]
    BillId(#[from] crate::bill_id::BillIdError),

    /// Entity failed publish-time schema validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that must abort the whole run before dispatch.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidSession { .. })
    }
}
