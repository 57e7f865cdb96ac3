//! HTTP routes.

pub mod chat;
pub mod data;
pub mod health;
pub mod models;

use axum::Json;
use serde::{Deserialize, Serialize};

pub use chat::{ChatBody, chat_handler};
pub use data::{AddDataBody, add_data_handler, delete_collection_handler};
pub use health::{HealthResponse, health_routes};
pub use models::{ModelNameBody, delete_handler, pull_handler, tags_handler};

/// Success envelope: `{"data": .., "code": 200}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub code: u16,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { data, code: 200 })
    }
}
