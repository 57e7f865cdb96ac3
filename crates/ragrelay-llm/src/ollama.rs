//! Ollama-compatible model-serving backend.
//!
//! Talks to the native API (`/api/tags`, `/api/delete`, `/api/pull`,
//! `/api/embeddings`, `/api/chat`). Streaming endpoints answer with
//! newline-delimited JSON which is decoded lazily as the consumer polls.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{ChatStream, InferenceBackend, PullStream, with_retry};
use crate::error::{LlmError, Result};
use crate::ndjson;
use crate::types::{ChatMessage, EmbeddingVector, ModelInfo, PullProgressEvent, StreamChunk};

/// Default base URL of a local Ollama instance.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default timeout for non-streaming requests.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout, applied to streaming requests as well.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL, without the `/api` suffix.
    pub base_url: String,

    /// Timeout for list/delete/embed requests. Streaming requests only have
    /// a connect timeout; stalls are handled by the relay's idle timeout.
    pub request_timeout: Duration,

    /// Connect timeout for every request.
    pub connect_timeout: Duration,

    /// Maximum retries for transient errors on non-streaming calls.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,

    /// Name for this backend instance.
    pub name: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
            name: "ollama".to_string(),
        }
    }
}

impl OllamaConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the non-streaming request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the backend name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ollama Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Ollama-compatible API backend.
///
/// Holds a single pooled `reqwest::Client`; construct once and share.
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url, path)
    }

    /// Read an error response into its status and the backend's message.
    async fn error_body(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<OllamaErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body.trim()));

        (status, message)
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .client
                    .get(self.url("tags"))
                    .timeout(self.config.request_timeout)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let (_, message) = Self::error_body(response).await;
                    return Err(LlmError::Backend(message));
                }

                let tags: OllamaTagsResponse = response.json().await?;
                Ok(tags.models.unwrap_or_default())
            },
        )
        .await
    }

    async fn delete_model(&self, name: &str) -> Result<()> {
        tracing::debug!(backend = %self.config.name, model = name, "Deleting model");

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .client
                    .delete(self.url("delete"))
                    .timeout(self.config.request_timeout)
                    .json(&OllamaModelRequest { model: name })
                    .send()
                    .await?;

                if response.status().is_success() {
                    return Ok(());
                }

                match Self::error_body(response).await {
                    (StatusCode::NOT_FOUND, _) => Err(LlmError::ModelNotFound(name.to_string())),
                    (_, message) => Err(LlmError::Backend(message)),
                }
            },
        )
        .await
    }

    async fn pull_model(&self, name: &str) -> Result<PullStream> {
        tracing::debug!(backend = %self.config.name, model = name, "Starting model pull");

        let response = self
            .client
            .post(self.url("pull"))
            .json(&OllamaPullRequest {
                model: name,
                stream: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return match Self::error_body(response).await {
                (StatusCode::NOT_FOUND, _) => Err(LlmError::ModelNotFound(name.to_string())),
                (_, message) => Err(LlmError::Backend(message)),
            };
        }

        Ok(decode_pull_stream(ndjson::lines(response.bytes_stream())))
    }

    async fn embed(&self, prompt: &str, embedding_model: &str) -> Result<EmbeddingVector> {
        let request = OllamaEmbeddingRequest {
            model: embedding_model,
            prompt,
        };

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .client
                    .post(self.url("embeddings"))
                    .timeout(self.config.request_timeout)
                    .json(&request)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let (_, message) = Self::error_body(response).await;
                    return Err(LlmError::Embedding(message));
                }

                let body = response.text().await?;
                let parsed: OllamaEmbeddingResponse = serde_json::from_str(&body)
                    .map_err(|e| LlmError::Embedding(format!("malformed response: {}", e)))?;

                if parsed.embedding.is_empty() {
                    return Err(LlmError::Embedding(format!(
                        "model '{}' returned an empty embedding",
                        embedding_model
                    )));
                }

                Ok(parsed.embedding)
            },
        )
        .await
    }

    async fn chat_stream(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatStream> {
        tracing::debug!(
            backend = %self.config.name,
            model,
            messages = messages.len(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(self.url("chat"))
            .json(&OllamaChatRequest {
                model,
                messages,
                stream: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return match Self::error_body(response).await {
                (StatusCode::NOT_FOUND, _) => Err(LlmError::ModelNotFound(model.to_string())),
                (_, message) => Err(LlmError::Inference(message)),
            };
        }

        Ok(decode_chat_stream(ndjson::lines(response.bytes_stream())))
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("version"))
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let (_, message) = Self::error_body(response).await;
            Err(LlmError::Backend(message))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decode chat NDJSON lines into [`StreamChunk`]s.
///
/// Ends after `Done`. An error line, a malformed line, a transport error, or
/// EOF before `done` each produce one terminal `Inference` error.
pub(crate) fn decode_chat_stream<S, E>(lines: S) -> ChatStream
where
    S: Stream<Item = std::result::Result<String, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(futures::stream::unfold(
        (Box::pin(lines), false),
        |(mut lines, finished)| async move {
            if finished {
                return None;
            }

            loop {
                let item = match lines.next().await {
                    Some(Ok(line)) => match serde_json::from_str::<OllamaChatLine>(&line) {
                        Ok(OllamaChatLine {
                            error: Some(message),
                            ..
                        }) => Err(LlmError::Inference(message)),
                        Ok(OllamaChatLine { done: true, .. }) => Ok(StreamChunk::Done),
                        Ok(OllamaChatLine { message, .. }) => {
                            let text = message.map(|m| m.content).unwrap_or_default();
                            if text.is_empty() {
                                continue;
                            }
                            Ok(StreamChunk::TextDelta { text })
                        }
                        Err(e) => Err(LlmError::Inference(format!("malformed chat chunk: {}", e))),
                    },
                    Some(Err(e)) => Err(LlmError::Inference(format!("stream read failed: {}", e))),
                    None => Err(LlmError::Inference(
                        "stream ended before completion".to_string(),
                    )),
                };

                let terminal = !matches!(item, Ok(StreamChunk::TextDelta { .. }));
                return Some((item, (lines, terminal)));
            }
        },
    ))
}

/// Decode pull NDJSON lines into [`PullProgressEvent`]s.
///
/// The final line of a pull either carries `done: true` or reports
/// `status: "success"`; both are normalized to `done == true`.
pub(crate) fn decode_pull_stream<S, E>(lines: S) -> PullStream
where
    S: Stream<Item = std::result::Result<String, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(futures::stream::unfold(
        (Box::pin(lines), false),
        |(mut lines, finished)| async move {
            if finished {
                return None;
            }

            let item = match lines.next().await {
                Some(Ok(line)) => match serde_json::from_str::<OllamaPullLine>(&line) {
                    Ok(OllamaPullLine {
                        error: Some(message),
                        ..
                    }) => Err(LlmError::Backend(message)),
                    Ok(parsed) => Ok(parsed.into_event()),
                    Err(e) => Err(LlmError::Serialization(format!(
                        "malformed pull progress: {}",
                        e
                    ))),
                },
                Some(Err(e)) => Err(LlmError::Backend(format!("stream read failed: {}", e))),
                None => Err(LlmError::Backend(
                    "pull stream ended before completion".to_string(),
                )),
            };

            let terminal = !matches!(item, Ok(PullProgressEvent { done: false, .. }));
            Some((item, (lines, terminal)))
        },
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Ollama API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaModelRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaPullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Option<Vec<ModelInfo>>,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatLine {
    #[serde(default)]
    message: Option<OllamaLineMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaLineMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaPullLine {
    #[serde(default)]
    status: String,
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaPullLine {
    fn into_event(self) -> PullProgressEvent {
        let done = self.done.unwrap_or(false) || self.status == "success";
        PullProgressEvent {
            status: self.status,
            digest: self.digest.filter(|d| !d.is_empty()),
            total: self.total,
            completed: self.completed,
            done,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
