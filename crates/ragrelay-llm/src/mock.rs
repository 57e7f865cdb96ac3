//! Scripted backend for tests.
//!
//! Lets route and relay tests exercise streaming behavior without a running
//! model server. Every call is recorded so tests can assert on what was sent.

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::{ChatStream, InferenceBackend, PullStream};
use crate::error::{LlmError, Result};
use crate::types::{ChatMessage, EmbeddingVector, ModelInfo, PullProgressEvent, StreamChunk};

/// A recorded chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedChat {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// A recorded embedding request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEmbed {
    pub prompt: String,
    pub model: String,
}

/// Mock backend that replays scripted responses.
#[derive(Clone)]
pub struct MockBackend {
    name: String,
    models: Arc<Mutex<Vec<ModelInfo>>>,
    chat_script: Arc<Vec<std::result::Result<StreamChunk, String>>>,
    pull_events: Arc<Vec<PullProgressEvent>>,
    embeddings: Arc<Vec<(String, EmbeddingVector)>>,
    default_embedding: Option<EmbeddingVector>,
    embed_failure: Option<String>,
    unavailable: bool,
    chunk_delay: Option<Duration>,
    chat_requests: Arc<Mutex<Vec<RecordedChat>>>,
    embed_requests: Arc<Mutex<Vec<RecordedEmbed>>>,
    polled: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a mock whose chat stream yields the given text chunks then `Done`.
    pub fn new(chunks: Vec<&str>) -> Self {
        Self {
            name: "mock".to_string(),
            models: Arc::new(Mutex::new(Vec::new())),
            chat_script: Arc::new(Vec::new()),
            pull_events: Arc::new(Vec::new()),
            embeddings: Arc::new(Vec::new()),
            default_embedding: Some(vec![0.0, 0.0, 0.0]),
            embed_failure: None,
            unavailable: false,
            chunk_delay: None,
            chat_requests: Arc::new(Mutex::new(Vec::new())),
            embed_requests: Arc::new(Mutex::new(Vec::new())),
            polled: Arc::new(AtomicUsize::new(0)),
        }
        .with_chat_chunks(chunks)
    }

    /// Locally available models.
    pub fn with_models(self, names: &[&str]) -> Self {
        *self.models.lock() = names.iter().map(|n| ModelInfo::named(*n)).collect();
        self
    }

    /// Chat chunks; a `Done` is appended automatically.
    pub fn with_chat_chunks(mut self, chunks: Vec<&str>) -> Self {
        let mut script: Vec<_> = chunks.into_iter().map(|c| Ok(StreamChunk::text(c))).collect();
        script.push(Ok(StreamChunk::Done));
        self.chat_script = Arc::new(script);
        self
    }

    /// Full chat script, including errors, replayed verbatim.
    pub fn with_chat_script(mut self, script: Vec<std::result::Result<StreamChunk, String>>) -> Self {
        self.chat_script = Arc::new(script);
        self
    }

    /// Pull progress events, replayed verbatim.
    pub fn with_pull_events(mut self, events: Vec<PullProgressEvent>) -> Self {
        self.pull_events = Arc::new(events);
        self
    }

    /// Fixed embedding for one exact prompt.
    pub fn with_embedding(mut self, prompt: &str, embedding: EmbeddingVector) -> Self {
        let mut table = (*self.embeddings).clone();
        table.push((prompt.to_string(), embedding));
        self.embeddings = Arc::new(table);
        self
    }

    /// Embedding returned for prompts without an exact entry.
    pub fn with_default_embedding(mut self, embedding: EmbeddingVector) -> Self {
        self.default_embedding = Some(embedding);
        self
    }

    /// Make every embed call fail.
    pub fn with_embed_failure(mut self, message: impl Into<String>) -> Self {
        self.embed_failure = Some(message.into());
        self
    }

    /// Make every call fail as if the server were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Sleep before yielding each chat chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Chat requests received so far.
    pub fn chat_requests(&self) -> Vec<RecordedChat> {
        self.chat_requests.lock().clone()
    }

    /// Embed requests received so far.
    pub fn embed_requests(&self) -> Vec<RecordedEmbed> {
        self.embed_requests.lock().clone()
    }

    /// Number of chat items pulled by consumers so far.
    pub fn chunks_polled(&self) -> usize {
        self.polled.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(LlmError::BackendUnavailable(
                "Connection failed: connection refused".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.check_available()?;
        Ok(self.models.lock().clone())
    }

    async fn delete_model(&self, name: &str) -> Result<()> {
        self.check_available()?;
        let mut models = self.models.lock();
        let before = models.len();
        models.retain(|m| m.name != name);
        if models.len() == before {
            return Err(LlmError::ModelNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn pull_model(&self, _name: &str) -> Result<PullStream> {
        self.check_available()?;
        let events: Vec<Result<PullProgressEvent>> =
            self.pull_events.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(events)))
    }

    async fn embed(&self, prompt: &str, embedding_model: &str) -> Result<EmbeddingVector> {
        self.check_available()?;
        self.embed_requests.lock().push(RecordedEmbed {
            prompt: prompt.to_string(),
            model: embedding_model.to_string(),
        });

        if let Some(message) = &self.embed_failure {
            return Err(LlmError::Embedding(message.clone()));
        }

        self.embeddings
            .iter()
            .find(|(p, _)| p == prompt)
            .map(|(_, e)| e.clone())
            .or_else(|| self.default_embedding.clone())
            .ok_or_else(|| LlmError::Embedding(format!("no embedding scripted for '{}'", prompt)))
    }

    async fn chat_stream(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatStream> {
        self.check_available()?;
        self.chat_requests.lock().push(RecordedChat {
            model: model.to_string(),
            messages: messages.to_vec(),
        });

        let script = Arc::clone(&self.chat_script);
        let polled = Arc::clone(&self.polled);
        let delay = self.chunk_delay;

        let stream = futures::stream::iter(0..script.len()).then(move |i| {
            let script = Arc::clone(&script);
            let polled = Arc::clone(&polled);
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                polled.fetch_add(1, Ordering::SeqCst);
                match &script[i] {
                    Ok(chunk) => Ok(chunk.clone()),
                    Err(message) => Err(LlmError::Inference(message.clone())),
                }
            }
        });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> Result<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_chat_appends_done() {
        let backend = MockBackend::new(vec!["a", "b"]);
        let stream = backend
            .chat_stream("m", &[ChatMessage::user("hi")])
            .await
            .unwrap();
        let items: Vec<_> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(
            items,
            vec![StreamChunk::text("a"), StreamChunk::text("b"), StreamChunk::Done]
        );
        assert_eq!(backend.chat_requests()[0].model, "m");
        assert_eq!(backend.chunks_polled(), 3);
    }

    #[tokio::test]
    async fn test_mock_delete_unknown() {
        let backend = MockBackend::new(vec![]).with_models(&["a"]);
        assert!(backend.delete_model("a").await.is_ok());
        assert!(matches!(
            backend.delete_model("a").await,
            Err(LlmError::ModelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_embedding_lookup() {
        let backend = MockBackend::new(vec![])
            .with_embedding("x", vec![1.0])
            .with_default_embedding(vec![2.0]);
        assert_eq!(backend.embed("x", "e").await.unwrap(), vec![1.0]);
        assert_eq!(backend.embed("y", "e").await.unwrap(), vec![2.0]);
        assert_eq!(backend.embed_requests().len(), 2);
    }
}
