//! Vector store types.

use serde::{Deserialize, Serialize};

/// Opaque reference to a collection in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHandle {
    /// Store-assigned identifier, used in per-collection URLs.
    pub id: String,
    /// Human-chosen collection name.
    pub name: String,
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The stored text.
    pub document: String,
    /// Distance from the query embedding (lower = more similar).
    pub distance: f32,
}

impl RetrievalResult {
    pub fn new(document: impl Into<String>, distance: f32) -> Self {
        Self {
            document: document.into(),
            distance,
        }
    }
}
