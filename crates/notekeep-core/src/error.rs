//! Error types for notekeep.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using notekeep's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notekeep operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found (storage objects, sessions)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Storage service failure other than a missing object
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// No authenticated session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that mean the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::NoteNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// A per-item error reported by a data service alongside an otherwise
/// successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    pub message: String,
    /// Identifies the item that failed, when the service knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.message, path),
            None => write!(f, "{}", self.message),
        }
    }
}
