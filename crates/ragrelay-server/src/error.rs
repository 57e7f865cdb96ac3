//! Error types for the server.
//!
//! Every non-streamed failure is rendered as the JSON envelope
//! `{"data": null, "code": <status>, "error": <kind>, "message": <text>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ragrelay_domain::DomainError;
use ragrelay_llm::LlmError;
use ragrelay_vector::VectorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed or semantically invalid request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body over the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The serving backend does not know the model.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The vector store has no such collection.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Parallel inputs or embedding sizes disagree.
    #[error("{0}")]
    DimensionMismatch(String),

    /// A backend could not be reached.
    #[error("{0}")]
    BackendUnavailable(String),

    /// Embedding failed.
    #[error("{0}")]
    Embedding(String),

    /// Generation failed.
    #[error("{0}")]
    Inference(String),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status and machine-readable kind.
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ServerError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ServerError::ModelNotFound(_) => (StatusCode::NOT_FOUND, "model_not_found"),
            ServerError::CollectionNotFound(_) => (StatusCode::NOT_FOUND, "collection_not_found"),
            ServerError::DimensionMismatch(_) => (StatusCode::BAD_REQUEST, "dimension_mismatch"),
            ServerError::BackendUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable")
            }
            ServerError::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            ServerError::Inference(_) => (StatusCode::BAD_GATEWAY, "inference_error"),
            ServerError::Backend(_) => (StatusCode::BAD_GATEWAY, "backend_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<LlmError> for ServerError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::BackendUnavailable(msg) => ServerError::BackendUnavailable(msg),
            LlmError::ModelNotFound(model) => ServerError::ModelNotFound(model),
            LlmError::Embedding(msg) => ServerError::Embedding(msg),
            LlmError::Inference(msg) => ServerError::Inference(msg),
            LlmError::Backend(msg) | LlmError::Serialization(msg) => ServerError::Backend(msg),
            LlmError::Config(msg) => ServerError::Internal(msg),
        }
    }
}

impl From<VectorError> for ServerError {
    fn from(e: VectorError) -> Self {
        match e {
            VectorError::Unavailable(msg) => ServerError::BackendUnavailable(msg),
            VectorError::CollectionNotFound(name) => ServerError::CollectionNotFound(name),
            VectorError::DimensionMismatch(msg) => ServerError::DimensionMismatch(msg),
            VectorError::Backend(msg) | VectorError::Serialization(msg) => {
                ServerError::Backend(msg)
            }
        }
    }
}

impl From<DomainError> for ServerError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            DomainError::Inference(e) => e.into(),
            DomainError::Vector(e) => e.into(),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error envelope body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always null for errors.
    pub data: Option<serde_json::Value>,
    /// HTTP status code.
    pub code: u16,
    /// Error kind for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, kind, error = %message, "Request failed");
        } else {
            tracing::warn!(status = %status, kind, error = %message, "Client error");
        }

        let body = ErrorEnvelope {
            data: None,
            code: status.as_u16(),
            error: kind.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ServerError, StatusCode)> = vec![
            (DomainError::InvalidRequest("x".into()).into(), StatusCode::BAD_REQUEST),
            (LlmError::ModelNotFound("m".into()).into(), StatusCode::NOT_FOUND),
            (VectorError::CollectionNotFound("rag".into()).into(), StatusCode::NOT_FOUND),
            (VectorError::DimensionMismatch("d".into()).into(), StatusCode::BAD_REQUEST),
            (LlmError::BackendUnavailable("down".into()).into(), StatusCode::SERVICE_UNAVAILABLE),
            (VectorError::Unavailable("down".into()).into(), StatusCode::SERVICE_UNAVAILABLE),
            (LlmError::Embedding("e".into()).into(), StatusCode::BAD_GATEWAY),
            (LlmError::Inference("i".into()).into(), StatusCode::BAD_GATEWAY),
            (VectorError::Backend("b".into()).into(), StatusCode::BAD_GATEWAY),
            (ServerError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_and_kind().0, status, "{:?}", err);
        }
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ServerError::ModelNotFound("ghost".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["data"], serde_json::Value::Null);
        assert_eq!(value["code"], 404);
        assert_eq!(value["error"], "model_not_found");
        assert_eq!(value["message"], "Model not found: ghost");
    }
}
