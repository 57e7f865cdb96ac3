//! Chat orchestration.
//!
//! A chat turn is validated, optionally augmented with retrieved context,
//! and handed to the model-serving backend. The resulting stream is returned
//! unconsumed so the transport layer can relay it.

use ragrelay_llm::{ChatMessage, ChatStream, SharedBackend};
use tracing::{debug, info};

use crate::error::{DomainError, Result};
use crate::services::retrieval::Augmentor;

/// One chat turn as received from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Conversation so far; the last element is the current user turn.
    pub messages: Vec<ChatMessage>,
    /// Correlation id echoed on every output record. `0` means unset.
    pub id: u64,
    /// Whether to augment the last message with retrieved context.
    pub rag_enabled: bool,
    /// Model to run.
    pub model: String,
}

/// A started chat turn, ready to be relayed.
pub struct ChatTurn {
    /// Backend completion stream.
    pub stream: ChatStream,
    /// Correlation id, present iff the request carried a non-zero id.
    pub correlation_id: Option<u64>,
    /// Whether the prompt was actually changed by retrieval.
    pub augmented: bool,
}

impl std::fmt::Debug for ChatTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTurn")
            .field("correlation_id", &self.correlation_id)
            .field("augmented", &self.augmented)
            .finish_non_exhaustive()
    }
}

/// Chat service.
#[derive(Clone)]
pub struct ChatService {
    backend: SharedBackend,
    augmentor: Augmentor,
}

impl ChatService {
    pub fn new(backend: SharedBackend, augmentor: Augmentor) -> Self {
        Self { backend, augmentor }
    }

    /// Start a chat turn.
    ///
    /// Everything that can fail before output exists (validation,
    /// augmentation, opening the backend stream) fails here, so the caller
    /// can still answer with an error status.
    pub async fn start(&self, request: ChatRequest) -> Result<ChatTurn> {
        validate(&request)?;

        let correlation_id = (request.id != 0).then_some(request.id);
        let mut augmented_prompt = None;

        if request.rag_enabled
            && let Some(last) = request.messages.last()
        {
            let prompt = self.augmentor.augment(&last.content).await?;
            if prompt != last.content {
                augmented_prompt = Some(prompt);
            }
        }

        let augmented = augmented_prompt.is_some();
        let messages = Self::effective_messages(&request.messages, augmented_prompt);

        debug!(
            model = %request.model,
            messages = messages.len(),
            rag = request.rag_enabled,
            augmented,
            "Opening chat stream"
        );

        let stream = self.backend.chat_stream(&request.model, &messages).await?;

        info!(
            model = %request.model,
            id = ?correlation_id,
            augmented,
            "Chat turn started"
        );

        Ok(ChatTurn {
            stream,
            correlation_id,
            augmented,
        })
    }

    /// The messages actually sent to the backend.
    ///
    /// Returns a copy of `messages`; with an augmented prompt, the last
    /// element is replaced by a user message carrying it. The caller's list
    /// is never modified.
    pub fn effective_messages(
        messages: &[ChatMessage],
        augmented_prompt: Option<String>,
    ) -> Vec<ChatMessage> {
        let mut effective = messages.to_vec();
        if let Some(prompt) = augmented_prompt
            && let Some(last) = effective.last_mut()
        {
            *last = ChatMessage::user(prompt);
        }
        effective
    }
}

fn validate(request: &ChatRequest) -> Result<()> {
    if request.messages.is_empty() {
        return Err(DomainError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }
    if request.model.trim().is_empty() {
        return Err(DomainError::InvalidRequest(
            "model must not be blank".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::retrieval::RetrievalSettings;
    use futures::StreamExt;
    use ragrelay_llm::{MockBackend, Role, StreamChunk};
    use ragrelay_vector::{MemoryVectorStore, VectorStore};
    use std::sync::Arc;

    fn service(backend: &MockBackend, store: &MemoryVectorStore) -> ChatService {
        let shared: SharedBackend = Arc::new(backend.clone());
        let augmentor = Augmentor::new(
            shared.clone(),
            Arc::new(store.clone()),
            RetrievalSettings {
                embedding_model: "embed".to_string(),
                collection: "rag".to_string(),
                top_k: 10,
                distance_threshold: 50.0,
            },
        );
        ChatService::new(shared, augmentor)
    }

    fn request(messages: Vec<ChatMessage>, rag: bool) -> ChatRequest {
        ChatRequest {
            messages,
            id: 0,
            rag_enabled: rag,
            model: "m1".to_string(),
        }
    }

    #[test]
    fn test_effective_messages_identity_without_prompt() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::assistant("hi"),
            ChatMessage::user("what?"),
        ];
        assert_eq!(ChatService::effective_messages(&messages, None), messages);
    }

    #[test]
    fn test_effective_messages_replaces_last_with_user() {
        let messages = vec![ChatMessage::user("first"), ChatMessage::assistant("second")];
        let effective =
            ChatService::effective_messages(&messages, Some("ctx.\n second".to_string()));

        assert_eq!(effective[0], messages[0]);
        assert_eq!(effective[1].role, Role::User);
        assert_eq!(effective[1].content, "ctx.\n second");
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_rag_disabled_sends_messages_unchanged() {
        let backend = MockBackend::new(vec!["hello"]);
        let store = MemoryVectorStore::new();
        let messages = vec![ChatMessage::user("hi")];

        let turn = service(&backend, &store)
            .start(request(messages.clone(), false))
            .await
            .unwrap();
        assert!(!turn.augmented);
        assert_eq!(turn.correlation_id, None);

        let items: Vec<_> = turn.stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![StreamChunk::text("hello"), StreamChunk::Done]);

        let sent = backend.chat_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].model, "m1");
        assert_eq!(sent[0].messages, messages);
        assert!(backend.embed_requests().is_empty());
    }

    #[tokio::test]
    async fn test_rag_enabled_augments_last_message() {
        let backend = MockBackend::new(vec!["ok"]).with_embedding("Q", vec![0.0]);
        let store = MemoryVectorStore::new();
        let handle = store.get_or_create_collection("rag").await.unwrap();
        store
            .add_documents(
                &handle,
                &["0".to_string()],
                &[vec![1.0]],
                &["Paris is in France".to_string()],
            )
            .await
            .unwrap();

        let mut req = request(vec![ChatMessage::assistant("hello"), ChatMessage::user("Q")], true);
        req.id = 42;
        let turn = service(&backend, &store).start(req).await.unwrap();
        assert!(turn.augmented);
        assert_eq!(turn.correlation_id, Some(42));

        let sent = &backend.chat_requests()[0].messages;
        assert_eq!(sent[0], ChatMessage::assistant("hello"));
        assert_eq!(sent[1], ChatMessage::user("Paris is in France.\n Q"));
    }

    #[tokio::test]
    async fn test_rag_enabled_empty_collection_is_identity() {
        let backend = MockBackend::new(vec!["ok"]);
        let store = MemoryVectorStore::new();
        let messages = vec![ChatMessage::user("Q")];

        let turn = service(&backend, &store)
            .start(request(messages.clone(), true))
            .await
            .unwrap();
        assert!(!turn.augmented);
        assert_eq!(backend.chat_requests()[0].messages, messages);
    }

    #[tokio::test]
    async fn test_empty_messages_rejected() {
        let backend = MockBackend::new(vec![]);
        let err = service(&backend, &MemoryVectorStore::new())
            .start(request(vec![], false))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
        assert!(backend.chat_requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_model_rejected() {
        let backend = MockBackend::new(vec![]);
        let mut req = request(vec![ChatMessage::user("hi")], false);
        req.model = " ".to_string();
        let err = service(&backend, &MemoryVectorStore::new())
            .start(req)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_before_streaming() {
        let backend = MockBackend::new(vec!["never"]).with_embed_failure("down");
        let err = service(&backend, &MemoryVectorStore::new())
            .start(request(vec![ChatMessage::user("hi")], true))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Inference(_)));
        assert!(backend.chat_requests().is_empty());
    }
}
