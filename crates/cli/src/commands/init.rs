use anyhow::{Context, Result};
use m5r_core::{Config, config::DEFAULT_TIMEOUT_MS};
use std::{env, path::PathBuf};
use tracing::info;

pub const CONFIG_FILE: &str = ".m5r.json";

pub fn init_command(cwd: Option<&str>, force: bool) -> Result<()> {
    let project_root = if let Some(cwd) = cwd {
        PathBuf::from(cwd)
    } else {
        env::current_dir().context("Failed to get current directory")?
    };

    let project_root = project_root
        .canonicalize()
        .context("Failed to canonicalize project root")?;
    let config_path = project_root.join(CONFIG_FILE);

    if config_path.exists() && !force {
        println!("❌ Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    let config = Config {
        timeout_ms: Some(DEFAULT_TIMEOUT_MS),
        ..Default::default()
    };
    config
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    info!("Wrote config to {}", config_path.display());
    println!("✅ Created {}", config_path.display());
    Ok(())
}
