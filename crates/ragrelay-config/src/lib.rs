//! Configuration system for the ragrelay service.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[inference]`, `[vector]` and `[rag]` sections
//! - Config file layering (user config dir + project-local overrides)
//! - Validation of values that would otherwise fail at request time
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
