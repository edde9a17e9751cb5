use anyhow::{Context, Result};
use m5r_core::{CancellationToken, Engine};
use std::io::Write;
use tracing::{debug, info};

use crate::cli::RunOptions;
use crate::config::{apply_run_options, load_config};
use crate::display::formatter::print_failure_summary;
use crate::utils::file::{document_dir, read_document, resolve_document};

pub async fn run_command(filepath: &str, options: &RunOptions) -> Result<()> {
    debug!("Running document: {}", filepath);

    let path = resolve_document(filepath)?;
    let document = read_document(&path)?;
    let config = load_config(document_dir(&path), options.config.as_deref())?;
    let engine = Engine::new(apply_run_options(config, options))?;

    // Ctrl-C kills running fragments instead of orphaning them
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling fragments");
            on_interrupt.cancel();
        }
    });

    let run = engine
        .run_with_cancel(&document, cancel)
        .await
        .with_context(|| format!("Failed to run {}", path.display()))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(run.output.as_bytes())?;
    if !run.output.is_empty() && !run.output.ends_with('\n') {
        writeln!(stdout)?;
    }
    stdout.flush()?;

    print_failure_summary(&run);
    Ok(())
}
