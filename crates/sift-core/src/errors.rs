//! Error types for sift-core.

use thiserror::Error;

use sift_store::StoreError;

/// Result type alias for sift-core operations.
pub type SiftResult<T> = Result<T, SiftError>;

/// Domain-specific errors for sift operations.
///
/// All variants abort the enclosing operation and surface to the caller;
/// nothing is retried internally. The single degrade-gracefully path in
/// the crate is the retriever's stale-reference skip, which is not an
/// error.
#[derive(Debug, Error)]
pub enum SiftError {
    /// Invalid or contradictory construction options.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A node lookup that is explicitly non-optional came back empty.
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: String },

    /// The embedding provider failed; fatal to the enclosing call.
    #[error("Embedding failed: {message}")]
    Embedding { message: String },

    /// The vector backend failed; fatal to the enclosing call.
    #[error("Vector backend error: {message}")]
    Backend { message: String },

    /// Storage layer error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiftError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a node-not-found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
