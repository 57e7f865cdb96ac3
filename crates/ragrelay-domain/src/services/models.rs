//! Model management on the serving backend.

use ragrelay_llm::{ModelInfo, PullStream, SharedBackend};
use tracing::info;

use crate::error::{DomainError, Result};

/// Model service.
#[derive(Clone)]
pub struct ModelService {
    backend: SharedBackend,
}

impl ModelService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Models available locally.
    pub async fn list(&self) -> Result<Vec<ModelInfo>> {
        Ok(self.backend.list_models().await?)
    }

    /// Delete a local model.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let name = required_name(name)?;
        self.backend.delete_model(name).await?;
        info!(model = name, "Deleted model");
        Ok(())
    }

    /// Start pulling a model; progress is relayed by the caller.
    pub async fn pull(&self, name: &str) -> Result<PullStream> {
        let name = required_name(name)?;
        let stream = self.backend.pull_model(name).await?;
        info!(model = name, "Model pull started");
        Ok(stream)
    }
}

fn required_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidRequest(
            "model name must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}
