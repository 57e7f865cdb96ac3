//! Domain services.

pub mod chat;
pub mod ingest;
pub mod models;
pub mod retrieval;

use ragrelay_config::RelayConfig;
use ragrelay_llm::SharedBackend;
use ragrelay_vector::SharedStore;
use tracing::info;

use retrieval::{Augmentor, RetrievalSettings};

/// Configuration for domain services.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainConfig {
    /// Model used when a request names none.
    pub default_model: String,
    /// Whether requests without an explicit flag are augmented.
    pub rag_by_default: bool,
    /// Retrieval and ingest parameters.
    pub retrieval: RetrievalSettings,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for DomainConfig {
    fn from(config: &RelayConfig) -> Self {
        let rag = config.rag();
        Self {
            default_model: config.inference().default_model,
            rag_by_default: rag.enabled_by_default,
            retrieval: RetrievalSettings {
                embedding_model: rag.embedding_model,
                collection: config.vector().collection,
                top_k: rag.top_k,
                distance_threshold: rag.distance_threshold,
            },
        }
    }
}

/// Domain services facade.
///
/// Main entry point for the transport layer. Cheap to clone; every service
/// shares the same backend clients.
#[derive(Clone)]
pub struct DomainServices {
    config: DomainConfig,
    chat: chat::ChatService,
    ingest: ingest::IngestService,
    models: models::ModelService,
    backend: SharedBackend,
    store: SharedStore,
}

impl DomainServices {
    /// Create domain services over the given backend clients.
    pub fn new(backend: SharedBackend, store: SharedStore, config: DomainConfig) -> Self {
        info!(
            backend = backend.name(),
            store = store.name(),
            collection = %config.retrieval.collection,
            "Initializing domain services"
        );

        let augmentor = Augmentor::new(backend.clone(), store.clone(), config.retrieval.clone());
        let chat = chat::ChatService::new(backend.clone(), augmentor);
        let ingest =
            ingest::IngestService::new(backend.clone(), store.clone(), config.retrieval.clone());
        let models = models::ModelService::new(backend.clone());

        Self {
            config,
            chat,
            ingest,
            models,
            backend,
            store,
        }
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Get the chat service.
    pub fn chat(&self) -> &chat::ChatService {
        &self.chat
    }

    /// Get the ingest service.
    pub fn ingest(&self) -> &ingest::IngestService {
        &self.ingest
    }

    /// Get the model service.
    pub fn models(&self) -> &models::ModelService {
        &self.models
    }

    /// Get the inference backend.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Get the vector store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragrelay_llm::MockBackend;
    use ragrelay_vector::MemoryVectorStore;
    use std::sync::Arc;

    #[test]
    fn test_domain_config_from_relay_config() {
        let relay = RelayConfig::from_toml(
            r#"
[inference]
default_model = "llama3"

[vector]
collection = "notes"

[rag]
enabled_by_default = false
distance_threshold = 0.8
"#,
        )
        .unwrap();

        let config = DomainConfig::from(&relay);
        assert_eq!(config.default_model, "llama3");
        assert!(!config.rag_by_default);
        assert_eq!(config.retrieval.collection, "notes");
        assert_eq!(config.retrieval.distance_threshold, 0.8);
        assert_eq!(config.retrieval.top_k, 10);
    }

    #[test]
    fn test_default_domain_config() {
        let config = DomainConfig::default();
        assert_eq!(config.default_model, "qwen:14b");
        assert!(config.rag_by_default);
        assert_eq!(config.retrieval, RetrievalSettings::default());
    }

    #[test]
    fn test_services_share_clients() {
        let services = DomainServices::new(
            Arc::new(MockBackend::new(vec![])),
            Arc::new(MemoryVectorStore::new()),
            DomainConfig::default(),
        );
        assert_eq!(services.backend().name(), "mock");
        assert_eq!(services.store().name(), "memory");
    }
}
