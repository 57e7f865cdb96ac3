//! Error types for the inference client.

use thiserror::Error;

/// Result type alias using the inference error type.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Error type for model-serving operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The serving process could not be reached (connect failure, timeout).
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend does not know the requested model.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Embedding request failed or returned a malformed response.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Chat generation failed, including aborts in the middle of a stream.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Any other error reported by the backend.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Returns true if this error is retryable.
    ///
    /// Only transport-level unavailability is retried; anything the backend
    /// actually answered is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::BackendUnavailable(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            LlmError::BackendUnavailable(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            LlmError::Serialization(err.to_string())
        } else {
            LlmError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
