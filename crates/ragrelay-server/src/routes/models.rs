//! Model management endpoints.

use axum::Json;
use axum::extract::State;
use axum::response::Response;
use ragrelay_domain::ModelInfo;
use serde::Deserialize;

use crate::error::Result;
use crate::extract::ValidJson;
use crate::relay::{PullEncoder, relay};
use crate::routes::Envelope;
use crate::state::AppState;

/// Body naming one model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelNameBody {
    pub name: String,
}

/// POST /tags - list local models.
pub async fn tags_handler(State(state): State<AppState>) -> Result<Json<Envelope<Vec<ModelInfo>>>> {
    let models = state.services.models().list().await?;
    Ok(Envelope::ok(models))
}

/// POST /delete - delete a local model.
pub async fn delete_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ModelNameBody>,
) -> Result<Json<Envelope<Option<()>>>> {
    state.services.models().delete(&body.name).await?;
    Ok(Envelope::ok(None))
}

/// POST /pull - stream model download progress as JSON lines.
pub async fn pull_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ModelNameBody>,
) -> Result<Response> {
    let stream = state.services.models().pull(&body.name).await?;
    Ok(relay(stream, PullEncoder, state.relay_options("pull")))
}
