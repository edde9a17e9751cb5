use anyhow::{Context, Result};
use m5r_core::Engine;
use std::path::PathBuf;

use crate::config::load_config;
use crate::display::formatter::print_toolchains;

pub fn toolchains_command(cwd: Option<&str>) -> Result<()> {
    let dir = match cwd {
        Some(cwd) => PathBuf::from(cwd),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let engine = Engine::new(load_config(&dir, None)?)?;
    print_toolchains(engine.registry());
    Ok(())
}
