//! Inference backend trait and shared helpers.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::types::{ChatMessage, EmbeddingVector, ModelInfo, PullProgressEvent, StreamChunk};

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors (backend unreachable). Non-retryable
/// errors are returned immediately. Never used for streaming calls: a stream
/// that already produced output cannot be replayed.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() || attempt >= max_retries => return Err(e),
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    backend = backend_name,
                    attempt,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming Types
// ─────────────────────────────────────────────────────────────────────────────

/// Chat completion stream.
///
/// Single producer. The last successful item is always [`StreamChunk::Done`];
/// a backend abort surfaces as a terminal `Err` item instead of a silently
/// truncated stream.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'static>>;

/// Model-pull progress stream, ending after the event with `done == true`.
pub type PullStream = Pin<Box<dyn Stream<Item = Result<PullProgressEvent>> + Send + 'static>>;

// ─────────────────────────────────────────────────────────────────────────────
// Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for model-serving backends.
///
/// Implementations are long-lived and shared across request tasks, so every
/// method takes `&self` and must be safe to call concurrently.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// List models available locally.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Delete a local model.
    ///
    /// Fails with [`LlmError::ModelNotFound`] if the backend does not know it.
    async fn delete_model(&self, name: &str) -> Result<()>;

    /// Start pulling a model, returning its progress stream.
    ///
    /// The stream must be drained or dropped; dropping closes the transport
    /// and releases backend-side resources.
    async fn pull_model(&self, name: &str) -> Result<PullStream>;

    /// Compute the embedding of `prompt` with `embedding_model`.
    async fn embed(&self, prompt: &str, embedding_model: &str) -> Result<EmbeddingVector>;

    /// Run a streaming chat completion.
    async fn chat_stream(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatStream>;

    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// A backend shared across request tasks.
pub type SharedBackend = Arc<dyn InferenceBackend>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, Duration::from_millis(1), "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(LlmError::BackendUnavailable("refused".to_string()))
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(2, Duration::from_millis(1), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::BackendUnavailable("refused".to_string()))
        })
        .await;

        assert!(matches!(result, Err(LlmError::BackendUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_backend_answers() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(5, Duration::from_millis(1), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::ModelNotFound("m".to_string()))
        })
        .await;

        assert!(matches!(result, Err(LlmError::ModelNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
