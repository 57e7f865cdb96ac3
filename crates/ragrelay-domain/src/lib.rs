//! Domain facade for ragrelay.
//!
//! Sits between the HTTP surface and the backend clients:
//!
//! - **Retrieval augmentation**: embed the prompt, query the vector store,
//!   prepend the close-enough documents
//! - **Chat orchestration**: validate a chat turn, optionally augment it, and
//!   open the backend's streaming completion
//! - **Ingest**: embed and store documents, drop the collection
//! - **Models**: list, delete and pull models on the serving backend
//!
//! # Example
//!
//! ```ignore
//! use ragrelay_domain::{ChatRequest, DomainServices};
//!
//! let services = DomainServices::new(backend, store, config);
//! let turn = services.chat().start(request).await?;
//! ```

mod error;
pub mod services;

pub use error::{DomainError, Result};
pub use services::chat::{ChatRequest, ChatService, ChatTurn};
pub use services::ingest::IngestService;
pub use services::models::ModelService;
pub use services::retrieval::{Augmentor, RetrievalSettings, build_augmented_prompt};
pub use services::{DomainConfig, DomainServices};

// Re-export key types from infrastructure crates for convenience
pub use ragrelay_llm::{
    ChatMessage, ChatStream, ModelInfo, PullProgressEvent, PullStream, Role, SharedBackend,
    StreamChunk,
};
pub use ragrelay_vector::{RetrievalResult, SharedStore};
