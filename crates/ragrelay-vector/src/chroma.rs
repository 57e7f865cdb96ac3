//! Chroma-compatible HTTP vector store.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, VectorError};
use crate::store::{VectorStore, check_parallel};
use crate::types::{CollectionHandle, RetrievalResult};

/// Default base URL of a local Chroma instance.
pub const DEFAULT_CHROMA_URL: &str = "http://127.0.0.1:8000";

/// Configuration for [`ChromaStore`].
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    /// Base URL, without the `/api/v1` suffix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Name for this store instance.
    pub name: String,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHROMA_URL.to_string(),
            timeout: Duration::from_secs(30),
            name: "chroma".to_string(),
        }
    }
}

impl ChromaConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Vector store backed by a Chroma server.
pub struct ChromaStore {
    client: Client,
    config: ChromaConfig,
}

impl ChromaStore {
    /// Create a new store client.
    pub fn new(config: ChromaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChromaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.config.base_url, path)
    }

    /// Map a non-success response to an error, recognising missing collections.
    async fn error_for(response: Response, collection: &str) -> VectorError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ChromaErrorBody>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| format!("HTTP {}: {}", status, body.trim()));

        if status == StatusCode::NOT_FOUND || message.to_lowercase().contains("does not exist") {
            VectorError::CollectionNotFound(collection.to_string())
        } else {
            VectorError::Backend(message)
        }
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<CollectionHandle> {
        let response = self
            .client
            .post(self.url("collections"))
            .json(&CreateCollectionRequest {
                name,
                get_or_create: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, name).await);
        }

        let handle: CollectionHandle = response.json().await?;
        tracing::debug!(collection = %handle.name, id = %handle.id, "Resolved collection");
        Ok(handle)
    }

    async fn add_documents(
        &self,
        collection: &CollectionHandle,
        ids: &[String],
        embeddings: &[Vec<f32>],
        documents: &[String],
    ) -> Result<()> {
        check_parallel(ids, embeddings, documents)?;

        let response = self
            .client
            .post(self.url(&format!("collections/{}/upsert", collection.id)))
            .json(&UpsertRequest {
                ids,
                embeddings,
                documents,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, &collection.name).await);
        }

        tracing::debug!(collection = %collection.name, count = ids.len(), "Upserted documents");
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let response = self
            .client
            .post(self.url(&format!("collections/{}/query", collection.id)))
            .json(&QueryRequest {
                query_embeddings: [embedding],
                n_results: top_k,
                include: ["documents", "distances"],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, &collection.name).await);
        }

        let body: QueryResponse = response.json().await?;
        let documents = body.documents.into_iter().next().unwrap_or_default();
        let distances = body.distances.into_iter().next().unwrap_or_default();

        if documents.len() != distances.len() {
            return Err(VectorError::Serialization(format!(
                "query returned {} documents but {} distances",
                documents.len(),
                distances.len()
            )));
        }

        let mut results: Vec<RetrievalResult> = documents
            .into_iter()
            .zip(distances)
            .map(|(doc, distance)| RetrievalResult::new(doc.unwrap_or_default(), distance))
            .collect();
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(results)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("collections/{}", name)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, name).await);
        }

        tracing::info!(collection = name, "Deleted collection");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    async fn health_check(&self) -> Result<()> {
        let response = self.client.get(self.url("heartbeat")).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(VectorError::Backend(format!(
                "heartbeat returned {}",
                response.status()
            )))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chroma API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: &'a [String],
    embeddings: &'a [Vec<f32>],
    documents: &'a [String],
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    include: [&'static str; 2],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ChromaErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
