//! Client for the local model-serving backend.
//!
//! This crate wraps the model-serving HTTP API (Ollama-compatible) behind the
//! [`InferenceBackend`] trait: listing, deleting and pulling models, computing
//! embeddings, and running chat completions with token-level streaming.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  InferenceBackend trait                      │
//! │  - list_models() / delete_model()            │
//! │  - pull_model()  -> Stream<PullProgressEvent>│
//! │  - embed()       -> EmbeddingVector          │
//! │  - chat_stream() -> Stream<StreamChunk>      │
//! └──────────────────────────────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!    ┌─────────────┐        ┌─────────────┐
//!    │OllamaBackend│        │ MockBackend │ (feature = "testing")
//!    └─────────────┘        └─────────────┘
//! ```
//!
//! Streams returned by the backend are lazy: nothing is read from the
//! transport until the consumer polls, and dropping a stream closes the
//! underlying HTTP response.

pub mod backend;
pub mod error;
pub mod ndjson;
pub mod ollama;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use backend::{ChatStream, InferenceBackend, PullStream, SharedBackend, with_retry};
pub use error::{LlmError, Result};
pub use ollama::{OllamaBackend, OllamaConfig};
pub use types::{ChatMessage, EmbeddingVector, ModelInfo, PullProgressEvent, Role, StreamChunk};

#[cfg(any(test, feature = "testing"))]
pub use mock::MockBackend;
