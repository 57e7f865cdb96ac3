//! Client for the external vector database.
//!
//! The vector index itself lives in a separate service (Chroma-compatible);
//! this crate only speaks its HTTP API behind the [`VectorStore`] trait:
//!
//! - get-or-create a named collection
//! - upsert documents with their embeddings
//! - nearest-neighbour query, ascending by distance
//! - delete a collection
//!
//! Distances are whatever metric the collection was created with; callers
//! must not assume a range.

pub mod chroma;
pub mod error;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use chroma::{ChromaConfig, ChromaStore};
pub use error::{Result, VectorError};
pub use store::{SharedStore, VectorStore};
pub use types::{CollectionHandle, RetrievalResult};

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryVectorStore;
