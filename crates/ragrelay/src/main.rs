//! ragrelay - streaming RAG relay for a local model server.
//!
//! Main entry point for the ragrelay CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, start, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// ragrelay - streaming RAG relay for a local model server
#[derive(Parser)]
#[command(name = "ragrelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Start(start::StartArgs),

    /// Check that the inference and vector backends are reachable
    Status(status::StatusArgs),

    /// Print the effective configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "ragrelay=debug,ragrelay_server=debug,ragrelay_domain=debug,ragrelay_llm=debug,ragrelay_vector=debug,ragrelay_config=debug,tower_http=debug,info"
    } else {
        "ragrelay=info,ragrelay_server=info,ragrelay_domain=info,ragrelay_llm=info,ragrelay_vector=info,warn"
    };

    let log_dir = ragrelay_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ragrelay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "ragrelay=trace,ragrelay_server=trace,ragrelay_domain=trace,ragrelay_llm=trace,ragrelay_vector=trace,ragrelay_config=trace,tower_http=debug,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
