//! The vector store trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Result, VectorError};
use crate::types::{CollectionHandle, RetrievalResult};

/// Trait for vector stores.
///
/// Implementations are shared across request tasks and hold no per-request
/// state.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return the named collection, creating it if absent. Idempotent.
    async fn get_or_create_collection(&self, name: &str) -> Result<CollectionHandle>;

    /// Insert or overwrite documents by id.
    ///
    /// `ids`, `embeddings` and `documents` are parallel and must have equal
    /// lengths.
    async fn add_documents(
        &self,
        collection: &CollectionHandle,
        ids: &[String],
        embeddings: &[Vec<f32>],
        documents: &[String],
    ) -> Result<()>;

    /// Return up to `top_k` nearest documents, ascending by distance.
    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>>;

    /// Remove a collection and everything in it.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Get the name of this store.
    fn name(&self) -> &str;

    /// Check that the store is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// A store shared across request tasks.
pub type SharedStore = Arc<dyn VectorStore>;

/// Reject parallel inputs of unequal length before any I/O happens.
pub(crate) fn check_parallel(
    ids: &[String],
    embeddings: &[Vec<f32>],
    documents: &[String],
) -> Result<()> {
    if ids.len() != embeddings.len() || ids.len() != documents.len() {
        return Err(VectorError::DimensionMismatch(format!(
            "{} ids, {} embeddings, {} documents",
            ids.len(),
            embeddings.len(),
            documents.len()
        )));
    }
    Ok(())
}
