//! Document ingest into the retrieval collection.

use ragrelay_llm::SharedBackend;
use ragrelay_vector::SharedStore;
use tracing::info;

use crate::error::{DomainError, Result};
use crate::services::retrieval::RetrievalSettings;

/// Ingest service.
#[derive(Clone)]
pub struct IngestService {
    backend: SharedBackend,
    store: SharedStore,
    settings: RetrievalSettings,
}

impl IngestService {
    pub fn new(backend: SharedBackend, store: SharedStore, settings: RetrievalSettings) -> Self {
        Self {
            backend,
            store,
            settings,
        }
    }

    /// Embed and store `documents` in the configured collection.
    ///
    /// Ids are the documents' positions in the list (`"0"`, `"1"`, ...), so
    /// ingesting a new list overwrites entries from a previous one at the
    /// same positions. Nothing is written if any embedding fails.
    pub async fn add_documents(&self, documents: &[String]) -> Result<usize> {
        if documents.is_empty() {
            return Err(DomainError::InvalidRequest(
                "dataList must not be empty".to_string(),
            ));
        }

        let collection = self
            .store
            .get_or_create_collection(&self.settings.collection)
            .await?;

        let mut embeddings = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = self
                .backend
                .embed(document, &self.settings.embedding_model)
                .await?;
            embeddings.push(embedding);
        }

        let ids: Vec<String> = (0..documents.len()).map(|i| i.to_string()).collect();
        self.store
            .add_documents(&collection, &ids, &embeddings, documents)
            .await?;

        info!(
            collection = %collection.name,
            count = documents.len(),
            "Ingested documents"
        );
        Ok(documents.len())
    }

    /// Drop the configured collection.
    pub async fn delete_collection(&self) -> Result<()> {
        self.store.delete_collection(&self.settings.collection).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragrelay_llm::MockBackend;
    use ragrelay_vector::{MemoryVectorStore, VectorError, VectorStore};
    use std::sync::Arc;

    fn service(backend: MockBackend, store: &MemoryVectorStore) -> IngestService {
        IngestService::new(
            Arc::new(backend),
            Arc::new(store.clone()),
            RetrievalSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_add_documents_embeds_each() {
        let backend = MockBackend::new(vec![])
            .with_embedding("alpha", vec![1.0, 0.0])
            .with_embedding("beta", vec![0.0, 1.0]);
        let store = MemoryVectorStore::new();

        let count = service(backend.clone(), &store)
            .add_documents(&["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.document_count("rag"), Some(2));

        let embeds = backend.embed_requests();
        assert_eq!(embeds.len(), 2);
        assert!(embeds.iter().all(|e| e.model == "mxbai-embed-large"));

        let handle = store.get_or_create_collection("rag").await.unwrap();
        let hits = store.query(&handle, &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].document, "beta");
    }

    #[tokio::test]
    async fn test_positional_ids_overwrite() {
        let store = MemoryVectorStore::new();
        let ingest = service(MockBackend::new(vec![]), &store);

        ingest
            .add_documents(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        ingest.add_documents(&["c".to_string()]).await.unwrap();
        assert_eq!(store.document_count("rag"), Some(2));
    }

    #[tokio::test]
    async fn test_empty_list_rejected() {
        let store = MemoryVectorStore::new();
        let err = service(MockBackend::new(vec![]), &store)
            .add_documents(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
        assert_eq!(store.document_count("rag"), None);
    }

    #[tokio::test]
    async fn test_embedding_failure_writes_nothing() {
        let store = MemoryVectorStore::new();
        let err = service(MockBackend::new(vec![]).with_embed_failure("down"), &store)
            .add_documents(&["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Inference(_)));
        assert_eq!(store.document_count("rag"), Some(0));
    }

    #[tokio::test]
    async fn test_delete_collection() {
        let store = MemoryVectorStore::new();
        let ingest = service(MockBackend::new(vec![]), &store);
        ingest.add_documents(&["a".to_string()]).await.unwrap();

        ingest.delete_collection().await.unwrap();
        assert_eq!(store.document_count("rag"), None);

        let err = ingest.delete_collection().await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Vector(VectorError::CollectionNotFound(_))
        ));
    }
}
