//! Status command - checks backend reachability.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use ragrelay_llm::InferenceBackend;
use ragrelay_vector::VectorStore;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the status command.
///
/// Fails when either backend is unreachable, so it can gate scripts.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load(args.config.as_deref())?;
    let config = loaded.config.resolved();

    let backend = super::inference_backend(&config)?;
    let store = super::vector_store(&config)?;

    let inference = backend.health_check().await.map_err(|e| e.to_string());
    let vector = store.health_check().await.map_err(|e| e.to_string());

    println!();
    println!("ragrelay backends");
    println!("{}", "─".repeat(40));
    print_line("inference", &backend.config().base_url, &inference, ctx.verbose);
    print_line("vector", &store.config().base_url, &vector, ctx.verbose);
    println!();

    if inference.is_err() || vector.is_err() {
        anyhow::bail!("one or more backends are unreachable");
    }
    Ok(())
}

fn print_line(label: &str, url: &str, result: &std::result::Result<(), String>, verbose: bool) {
    match result {
        Ok(()) => println!("  {:<10} {:<30} ● reachable", label, url),
        Err(e) => {
            println!("  {:<10} {:<30} ● unreachable", label, url);
            if verbose {
                println!("  {:<10} {}", "", e);
            }
        }
    }
}
