//! In-process vector store for tests.
//!
//! Brute-force squared-L2 search over a map of collections. Not an index:
//! it exists so augmentation and ingest logic can be tested end to end.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{Result, VectorError};
use crate::store::{VectorStore, check_parallel};
use crate::types::{CollectionHandle, RetrievalResult};

struct Collection {
    id: String,
    entries: BTreeMap<String, (Vec<f32>, String)>,
}

/// In-memory [`VectorStore`].
#[derive(Clone, Default)]
pub struct MemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    next_id: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of documents in a collection, if it exists.
    pub fn document_count(&self, name: &str) -> Option<usize> {
        self.collections.read().get(name).map(|c| c.entries.len())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(VectorError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<CollectionHandle> {
        self.check_available()?;
        let mut collections = self.collections.write();
        let collection = collections.entry(name.to_string()).or_insert_with(|| Collection {
            id: format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            entries: BTreeMap::new(),
        });
        Ok(CollectionHandle {
            id: collection.id.clone(),
            name: name.to_string(),
        })
    }

    async fn add_documents(
        &self,
        collection: &CollectionHandle,
        ids: &[String],
        embeddings: &[Vec<f32>],
        documents: &[String],
    ) -> Result<()> {
        check_parallel(ids, embeddings, documents)?;
        self.check_available()?;

        let mut collections = self.collections.write();
        let target = collections
            .get_mut(&collection.name)
            .filter(|c| c.id == collection.id)
            .ok_or_else(|| VectorError::CollectionNotFound(collection.name.clone()))?;

        // Whole batch is checked before the first write.
        let dims = target
            .entries
            .values()
            .next()
            .map(|(e, _)| e.len())
            .or_else(|| embeddings.first().map(Vec::len));
        if let Some(dims) = dims
            && let Some(bad) = embeddings.iter().find(|e| e.len() != dims)
        {
            return Err(VectorError::DimensionMismatch(format!(
                "expected {} dimensions, got {}",
                dims,
                bad.len()
            )));
        }

        for ((id, embedding), document) in ids.iter().zip(embeddings).zip(documents) {
            target
                .entries
                .insert(id.clone(), (embedding.clone(), document.clone()));
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        self.check_available()?;

        let collections = self.collections.read();
        let target = collections
            .get(&collection.name)
            .ok_or_else(|| VectorError::CollectionNotFound(collection.name.clone()))?;

        let mut results: Vec<RetrievalResult> = target
            .entries
            .values()
            .map(|(stored, document)| RetrievalResult::new(document.clone(), squared_l2(stored, embedding)))
            .collect();
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.check_available()?;
        self.collections
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VectorError::CollectionNotFound(name.to_string()))
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<()> {
        self.check_available()
    }
}
