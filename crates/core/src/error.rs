//! Error types for tenrag.
//!
//! A single error enum covers configuration, caller input, backend response
//! shape, and transport failures. Builder and normalizer return these
//! directly to their caller; nothing in this crate retries.

use thiserror::Error;

/// Unified error type for tenrag.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed caller-supplied request parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backend returned data that does not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Opaque failure reported by the transport collaborator
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    /// Shorthand for a `MalformedResponse` error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        AppError::MalformedResponse(msg.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
