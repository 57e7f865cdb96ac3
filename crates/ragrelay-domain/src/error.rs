//! Domain error types.

use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The caller sent something that cannot be served.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model-serving backend error.
    #[error(transparent)]
    Inference(#[from] ragrelay_llm::LlmError),

    /// Vector store error.
    #[error(transparent)]
    Vector(#[from] ragrelay_vector::VectorError),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
