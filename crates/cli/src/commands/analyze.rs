use anyhow::Result;
use m5r_core::Engine;
use tracing::debug;

use crate::config::load_config;
use crate::display::formatter::print_extraction;
use crate::utils::file::{document_dir, read_document, resolve_document};

pub fn analyze_command(filepath: &str, verbose: bool) -> Result<()> {
    debug!("Analyzing document: {}", filepath);

    let path = resolve_document(filepath)?;
    let document = read_document(&path)?;
    let engine = Engine::new(load_config(document_dir(&path), None)?)?;
    let extraction = engine.analyze(&document);

    if verbose {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        print_extraction(&path, &extraction, engine.registry());
    }

    Ok(())
}
