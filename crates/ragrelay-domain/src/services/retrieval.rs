//! Retrieval augmentation.
//!
//! Turns a prompt into an augmented prompt by prepending the stored documents
//! whose embeddings lie within the distance threshold of the prompt's.

use ragrelay_llm::SharedBackend;
use ragrelay_vector::{RetrievalResult, SharedStore};
use tracing::debug;

use crate::error::Result;

/// Retrieval parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    /// Model used to embed prompts and ingested documents.
    pub embedding_model: String,
    /// Collection queried for context.
    pub collection: String,
    /// Nearest neighbours fetched per query.
    pub top_k: usize,
    /// Keep a document only when `distance < distance_threshold`.
    pub distance_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        let rag = ragrelay_config::RagSection::default();
        Self {
            embedding_model: rag.embedding_model,
            collection: ragrelay_config::VectorSection::default().collection,
            top_k: rag.top_k,
            distance_threshold: rag.distance_threshold,
        }
    }
}

/// Build the augmented prompt from kept documents.
///
/// Documents are joined with `".\n"` and followed by `".\n "` and the
/// original prompt. With no documents the prompt is returned unchanged.
pub fn build_augmented_prompt(documents: &[String], prompt: &str) -> String {
    if documents.is_empty() {
        return prompt.to_string();
    }
    format!("{}.\n {}", documents.join(".\n"), prompt)
}

/// Retrieval augmentor.
#[derive(Clone)]
pub struct Augmentor {
    backend: SharedBackend,
    store: SharedStore,
    settings: RetrievalSettings,
}

impl Augmentor {
    pub fn new(backend: SharedBackend, store: SharedStore, settings: RetrievalSettings) -> Self {
        Self {
            backend,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Documents closer than the threshold, nearest first.
    pub async fn retrieve(&self, prompt: &str) -> Result<Vec<String>> {
        let embedding = self
            .backend
            .embed(prompt, &self.settings.embedding_model)
            .await?;

        let collection = self
            .store
            .get_or_create_collection(&self.settings.collection)
            .await?;

        let results = self
            .store
            .query(&collection, &embedding, self.settings.top_k)
            .await?;
        let fetched = results.len();

        let kept = filter_by_distance(results, self.settings.distance_threshold);

        debug!(
            collection = %self.settings.collection,
            fetched,
            kept = kept.len(),
            threshold = self.settings.distance_threshold,
            "Retrieved context"
        );

        Ok(kept)
    }

    /// Augment `prompt` with retrieved context.
    ///
    /// An empty collection, or one with nothing within the threshold, leaves
    /// the prompt unchanged.
    pub async fn augment(&self, prompt: &str) -> Result<String> {
        let kept = self.retrieve(prompt).await?;
        Ok(build_augmented_prompt(&kept, prompt))
    }
}

/// Keep documents strictly closer than `threshold`, preserving order.
fn filter_by_distance(results: Vec<RetrievalResult>, threshold: f32) -> Vec<String> {
    results
        .into_iter()
        .filter(|r| r.distance < threshold)
        .map(|r| r.document)
        .collect()
}
