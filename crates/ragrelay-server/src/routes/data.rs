//! Vector store ingest endpoints.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::error::Result;
use crate::extract::ValidJson;
use crate::routes::Envelope;
use crate::state::AppState;

/// Wire body of `POST /addData`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddDataBody {
    #[serde(rename = "dataList")]
    pub data_list: Vec<String>,
}

/// POST /addData - embed and store documents.
pub async fn add_data_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<AddDataBody>,
) -> Result<Json<Envelope<&'static str>>> {
    state.services.ingest().add_documents(&body.data_list).await?;
    Ok(Envelope::ok("ok"))
}

/// POST /deleteCollection - drop the retrieval collection.
pub async fn delete_collection_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Option<()>>>> {
    state.services.ingest().delete_collection().await?;
    Ok(Envelope::ok(None))
}
