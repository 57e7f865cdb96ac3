//! Config command - prints the effective configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load(args.config.as_deref())?;

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("# No config files loaded (using defaults)");
    } else {
        for source in &sources {
            println!("# {}", source.display());
        }
    }

    if ctx.verbose {
        for source in loaded.sources.iter().filter(|s| !s.loaded) {
            println!("# not found: {}", source.path.display());
        }
    }

    let config = loaded.config.clone().resolved();
    if let Err(e) = config.validate() {
        println!("# invalid: {}", e);
    }
    println!();
    print!("{}", config.to_toml()?);

    Ok(())
}
