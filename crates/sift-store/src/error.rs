//! Error types for sift-store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sift-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in sift-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A persisted store file does not exist.
    #[error("Persisted store not found at {path}")]
    NotFound { path: PathBuf },

    /// A key already exists and overwriting was disallowed.
    #[error("Key `{key}` already exists in namespace `{namespace}`")]
    DuplicateKey { namespace: String, key: String },

    /// The backend does not support the requested operation.
    #[error("Backend `{backend}` does not support `{operation}`")]
    Unsupported { backend: String, operation: String },

    /// Persisted data is not well-formed.
    #[error("Parse error at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a duplicate-key error.
    pub fn duplicate_key(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
