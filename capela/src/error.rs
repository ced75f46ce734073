//! Error types.

use thiserror::Error;

/// The main error type for capela operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The store returned an error response.
    #[error("Store error [{code}]: {message}")]
    Store { code: u16, message: String },

    /// No authenticated session exists.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A required field was missing in a record.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Invalid argument passed to an API method.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Create a store error.
    pub fn store(code: u16, message: impl Into<String>) -> Self {
        Error::Store {
            code,
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Error::MissingField(field.into())
    }

    /// Check if this error is potentially retryable. The polling loops use
    /// this only for log verbosity; the next tick is the retry either way.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Store { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::NotAuthenticated => true,
            Error::Store { code, .. } => *code == 401 || *code == 403,
            _ => false,
        }
    }
}

/// Result type alias for capela operations.
pub type Result<T> = std::result::Result<T, Error>;
