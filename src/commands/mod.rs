pub mod export;
pub mod inspect;

// Re-export command functions for convenience
pub use export::{export, ExportParams};
pub use inspect::{ancestors, tree};

use anyhow::{Context, Result};
use std::path::Path;

use ontoweave::config::Config;

/// Load the run configuration, apply environment overrides and validate it
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::from_file(path)?;
    config
        .apply_env_overrides()
        .context("Invalid ONTOWEAVE_* environment override")?;
    Ok(config)
}
