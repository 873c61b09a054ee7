//! Error types for testlens.
//!
//! Logging and lifecycle aggregation never surface errors to callers; this type
//! covers the fallible edges around them: parsing level names, loading logger
//! configuration and decoding recorded lifecycle event streams.

use thiserror::Error;

/// Result alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown log level '{0}' (expected one of DEBUG, INFO, WARN, ERROR, SILENT)")]
    InvalidLevel(String),

    #[error("Invalid lifecycle event on line {line}: {message}")]
    Event { line: usize, message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_level(value: impl Into<String>) -> Self {
        Self::InvalidLevel(value.into())
    }

    pub fn event(line: usize, message: impl Into<String>) -> Self {
        Self::Event {
            line,
            message: message.into(),
        }
    }
}
