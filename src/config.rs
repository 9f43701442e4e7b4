//! Configuration loading
//!
//! Embedded defaults, then optional files, then `LEXFORGE_*` environment
//! variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use lexforge_core::LexforgeConfig;
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Load configuration, with `path` layered above `config/local.toml`
pub fn load_config(path: Option<&Path>) -> Result<LexforgeConfig> {
    let mut builder = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/local").required(false));

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    // prefix_separator("_") so LEXFORGE_ROUTER__LOCALE maps to router.locale
    let config = builder
        .add_source(
            Environment::with_prefix("LEXFORGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let config: LexforgeConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
