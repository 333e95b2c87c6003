//! Init command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Write the default configuration to `config_path`
pub fn run(force: bool, config_path: &Path) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            config_path.display()
        );
    }

    Config::default().save(config_path)?;
    println!("[OK] Default configuration written to {}", config_path.display());
    Ok(())
}
