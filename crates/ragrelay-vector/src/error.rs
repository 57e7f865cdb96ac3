//! Error types for the vector store client.

use thiserror::Error;

/// Errors that can occur talking to the vector store.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The store could not be reached.
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),

    /// The named collection does not exist.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Parallel input sequences differ in length, or an embedding's
    /// dimensionality does not match the collection.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Any other error reported by the store.
    #[error("Vector store error: {0}")]
    Backend(String),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for vector store operations.
pub type Result<T> = std::result::Result<T, VectorError>;

impl From<reqwest::Error> for VectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            VectorError::Unavailable(err.to_string())
        } else if err.is_decode() {
            VectorError::Serialization(err.to_string())
        } else {
            VectorError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Serialization(err.to_string())
    }
}
