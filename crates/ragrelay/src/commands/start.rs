//! Start command - launches the relay server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use ragrelay_config::RelayConfig;
use ragrelay_domain::{DomainConfig, DomainServices};
use ragrelay_llm::InferenceBackend;
use ragrelay_server::{Server, ServerConfig};
use ragrelay_vector::VectorStore;

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model server base URL (overrides config)
    #[arg(long, env = "RAGRELAY_OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Vector store base URL (overrides config)
    #[arg(long, env = "RAGRELAY_CHROMA_URL")]
    pub chroma_url: Option<String>,

    /// Default chat model (overrides config)
    #[arg(long)]
    pub model: Option<String>,
}

impl StartArgs {
    /// Layer CLI flags over the loaded configuration.
    fn apply(&self, config: RelayConfig) -> RelayConfig {
        let mut config = config.resolved();

        if let Some(server) = config.server.as_mut() {
            if let Some(ref bind) = self.bind {
                server.bind = bind.clone();
            }
            if let Some(port) = self.port {
                server.port = port;
            }
        }

        if let Some(inference) = config.inference.as_mut() {
            if let Some(ref url) = self.ollama_url {
                inference.base_url = url.clone();
            }
            if let Some(ref model) = self.model {
                inference.default_model = model.clone();
            }
        }

        if let Some(vector) = config.vector.as_mut()
            && let Some(ref url) = self.chroma_url
        {
            vector.base_url = url.clone();
        }

        config
    }
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load(args.config.as_deref())?;
    let config = args.apply(loaded.config);
    config.validate()?;

    if ctx.verbose {
        for path in loaded
            .sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| &s.path)
        {
            info!(path = %path.display(), "Loaded config");
        }
    }

    let backend = super::inference_backend(&config)?;
    let store = super::vector_store(&config)?;

    // Unreachable backends are reported, not fatal; requests fail with 503
    // until they come up.
    if let Err(e) = backend.health_check().await {
        warn!(url = %backend.config().base_url, error = %e, "Model server not reachable");
    }
    if let Err(e) = store.health_check().await {
        warn!(url = %store.config().base_url, error = %e, "Vector store not reachable");
    }

    let services = DomainServices::new(
        Arc::new(backend),
        Arc::new(store),
        DomainConfig::from(&config),
    );
    let server_config = ServerConfig::try_from(&config.server())?;

    info!(
        bind = %server_config.bind_address,
        model = %services.config().default_model,
        collection = %services.config().retrieval.collection,
        "Starting ragrelay"
    );

    Server::new(services, server_config).run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = RelayConfig::from_toml(
            "[server]\nport = 9000\ncors = false\n\n[inference]\ndefault_model = \"llama3\"",
        )
        .unwrap();

        let args = StartArgs {
            bind: Some("0.0.0.0".to_string()),
            port: Some(9100),
            ollama_url: Some("http://gpu:11434".to_string()),
            chroma_url: Some("http://db:8000".to_string()),
            model: Some("mistral".to_string()),
            ..Default::default()
        };

        let merged = args.apply(config);
        let server = merged.server();
        assert_eq!(server.bind, "0.0.0.0");
        assert_eq!(server.port, 9100);
        assert!(!server.cors);
        assert_eq!(merged.inference().base_url, "http://gpu:11434");
        assert_eq!(merged.inference().default_model, "mistral");
        assert_eq!(merged.vector().base_url, "http://db:8000");
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let config = RelayConfig::from_toml("[server]\nport = 9000").unwrap();
        let merged = StartArgs::default().apply(config);

        assert_eq!(merged.server().port, 9000);
        assert_eq!(merged.inference().default_model, "qwen:14b");
        assert!(merged.rag.is_some());
    }
}
