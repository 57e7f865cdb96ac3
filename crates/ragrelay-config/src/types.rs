//! Configuration types.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 7010
//! cors = true
//! max_body_bytes = 102400
//! stream_idle_timeout_secs = 120
//!
//! [inference]
//! base_url = "http://127.0.0.1:11434"
//! default_model = "qwen:14b"
//!
//! [vector]
//! base_url = "http://127.0.0.1:8000"
//! collection = "rag"
//!
//! [rag]
//! enabled_by_default = true
//! embedding_model = "mxbai-embed-large"
//! top_k = 10
//! distance_threshold = 50.0
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Defaults matching a stock local setup.
pub mod defaults {
    pub const BIND: &str = "127.0.0.1";
    pub const PORT: u16 = 7010;
    pub const MAX_BODY_BYTES: usize = 100 * 1024;
    pub const STREAM_IDLE_TIMEOUT_SECS: u64 = 120;
    pub const INFERENCE_URL: &str = "http://127.0.0.1:11434";
    pub const MODEL: &str = "qwen:14b";
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const MAX_RETRIES: u32 = 2;
    pub const VECTOR_URL: &str = "http://127.0.0.1:8000";
    pub const COLLECTION: &str = "rag";
    pub const EMBEDDING_MODEL: &str = "mxbai-embed-large";
    pub const TOP_K: usize = 10;
    pub const DISTANCE_THRESHOLD: f32 = 50.0;
}

/// Root configuration structure.
///
/// Sections are optional so that partial files (e.g. project-local
/// overrides) can be loaded and merged section by section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: Option<ServerSection>,
    pub inference: Option<InferenceSection>,
    pub vector: Option<VectorSection>,
    pub rag: Option<RagSection>,
}

impl RelayConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: RelayConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.inference.is_some() {
            self.inference = other.inference;
        }
        if other.vector.is_some() {
            self.vector = other.vector;
        }
        if other.rag.is_some() {
            self.rag = other.rag;
        }
    }

    /// Fill every absent section with its defaults.
    pub fn resolved(mut self) -> Self {
        self.server.get_or_insert_with(ServerSection::default);
        self.inference.get_or_insert_with(InferenceSection::default);
        self.vector.get_or_insert_with(VectorSection::default);
        self.rag.get_or_insert_with(RagSection::default);
        self
    }

    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    pub fn inference(&self) -> InferenceSection {
        self.inference.clone().unwrap_or_default()
    }

    pub fn vector(&self) -> VectorSection {
        self.vector.clone().unwrap_or_default()
    }

    pub fn rag(&self) -> RagSection {
        self.rag.clone().unwrap_or_default()
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        let server = self.server();
        if server.max_body_bytes == 0 {
            return Err(ConfigError::invalid("server.max_body_bytes", "must be positive"));
        }
        if server.stream_idle_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "server.stream_idle_timeout_secs",
                "must be positive",
            ));
        }

        let inference = self.inference();
        if inference.default_model.trim().is_empty() {
            return Err(ConfigError::invalid("inference.default_model", "must not be blank"));
        }
        if inference.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("inference.base_url", "must not be blank"));
        }

        let vector = self.vector();
        if vector.collection.trim().is_empty() {
            return Err(ConfigError::invalid("vector.collection", "must not be blank"));
        }
        if vector.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("vector.base_url", "must not be blank"));
        }

        let rag = self.rag();
        if rag.embedding_model.trim().is_empty() {
            return Err(ConfigError::invalid("rag.embedding_model", "must not be blank"));
        }
        if rag.top_k == 0 {
            return Err(ConfigError::invalid("rag.top_k", "must be at least 1"));
        }
        if rag.distance_threshold.is_nan() || rag.distance_threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "rag.distance_threshold",
                format!("must be a positive number, got {}", rag.distance_threshold),
            ));
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Allow any origin, method and header.
    pub cors: bool,
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Abort a relayed stream when the backend is silent this long.
    pub stream_idle_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: defaults::BIND.to_string(),
            port: defaults::PORT,
            cors: true,
            max_body_bytes: defaults::MAX_BODY_BYTES,
            stream_idle_timeout_secs: defaults::STREAM_IDLE_TIMEOUT_SECS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backends
// ─────────────────────────────────────────────────────────────────────────────

/// Model-serving backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSection {
    pub base_url: String,
    /// Model used when a chat request names none.
    pub default_model: String,
    /// Timeout for non-streaming calls.
    pub request_timeout_secs: u64,
    /// Retries for transient failures on non-streaming calls.
    pub max_retries: u32,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            base_url: defaults::INFERENCE_URL.to_string(),
            default_model: defaults::MODEL.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
        }
    }
}

/// Vector database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSection {
    pub base_url: String,
    /// Collection used for both retrieval and ingest.
    pub collection: String,
}

impl Default for VectorSection {
    fn default() -> Self {
        Self {
            base_url: defaults::VECTOR_URL.to_string(),
            collection: defaults::COLLECTION.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Retrieval
// ─────────────────────────────────────────────────────────────────────────────

/// Retrieval augmentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSection {
    /// Whether a chat request without a `rag` field is augmented.
    pub enabled_by_default: bool,
    pub embedding_model: String,
    /// Nearest neighbours fetched per query.
    pub top_k: usize,
    /// Documents are kept only when strictly closer than this. The scale
    /// depends on the collection's distance metric.
    pub distance_threshold: f32,
}

impl Default for RagSection {
    fn default() -> Self {
        Self {
            enabled_by_default: true,
            embedding_model: defaults::EMBEDDING_MODEL.to_string(),
            top_k: defaults::TOP_K,
            distance_threshold: defaults::DISTANCE_THRESHOLD,
        }
    }
}
