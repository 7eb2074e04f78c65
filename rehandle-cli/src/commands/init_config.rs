use anyhow::{Context, Result};
use rehandle::Config;
use std::path::PathBuf;

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::global_config_path().context("Could not determine home directory")?,
    };

    if path.exists() {
        anyhow::bail!(
            "Config file already exists: {} (remove it first to regenerate)",
            path.display()
        );
    }

    Config::create_default_config(&path)?;
    println!("✓ Wrote default config to {}", path.display());
    println!("  Set [github].token there or export GITHUB_TOKEN before running.");

    Ok(())
}
