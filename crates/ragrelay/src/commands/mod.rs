//! CLI command handlers.

pub mod config;
pub mod start;
pub mod status;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use ragrelay_config::{ConfigSource, LoadedConfig, RelayConfig};
use ragrelay_llm::{OllamaBackend, OllamaConfig};
use ragrelay_vector::{ChromaConfig, ChromaStore};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load configuration from an explicit file, or by layered discovery.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match explicit {
        Some(path) => LoadedConfig {
            config: ragrelay_config::load_config_file(path)?,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings: Vec::new(),
        },
        None => ragrelay_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    Ok(loaded)
}

/// Build the inference client from the `[inference]` section.
pub fn inference_backend(config: &RelayConfig) -> Result<OllamaBackend> {
    let section = config.inference();
    let backend = OllamaBackend::new(
        OllamaConfig::default()
            .with_base_url(section.base_url)
            .with_request_timeout(Duration::from_secs(section.request_timeout_secs))
            .with_max_retries(section.max_retries),
    )?;
    Ok(backend)
}

/// Build the vector store client from the `[vector]` section.
pub fn vector_store(config: &RelayConfig) -> Result<ChromaStore> {
    let section = config.vector();
    let store = ChromaStore::new(ChromaConfig::default().with_base_url(section.base_url))?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9100\n\n[vector]\ncollection = \"docs\"").unwrap();

        let loaded = load(Some(file.path())).unwrap();
        assert_eq!(loaded.loaded_from(), vec![file.path()]);
        assert_eq!(loaded.config.server().port, 9100);
        assert_eq!(loaded.config.vector().collection, "docs");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_clients_use_configured_urls() {
        let config = RelayConfig::from_toml(
            "[inference]\nbase_url = \"http://gpu:11434/\"\n\n[vector]\nbase_url = \"http://db:8000\"",
        )
        .unwrap();

        let backend = inference_backend(&config).unwrap();
        assert_eq!(backend.config().base_url, "http://gpu:11434");

        let store = vector_store(&config).unwrap();
        assert_eq!(store.config().base_url, "http://db:8000");
    }
}
