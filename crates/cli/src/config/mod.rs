//! Config resolution for the CLI: file discovery plus flag overrides.

use anyhow::{Context, Result};
use m5r_core::{Config, OutputOrdering};
use std::path::Path;
use tracing::debug;

use crate::cli::RunOptions;

/// Load the explicit config file if given, else the nearest `.m5r.json`
/// above `start_dir`, else the defaults.
pub fn load_config(start_dir: &Path, explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            debug!("Using config file {}", path.display());
            Config::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Config::discover(start_dir).context("Failed to load config"),
    }
}

/// Command-line flags win over file values.
pub fn apply_run_options(mut config: Config, options: &RunOptions) -> Config {
    if let Some(timeout_ms) = options.timeout_ms {
        config.timeout_ms = Some(timeout_ms);
    }
    if let Some(jobs) = options.jobs {
        config.max_workers = Some(jobs);
    }
    if options.annotate {
        config.annotate_failures = true;
    }
    if options.document_order {
        config.ordering = OutputOrdering::Document;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_file_values() {
        let config = Config {
            timeout_ms: Some(1000),
            max_workers: Some(8),
            ..Default::default()
        };
        let options = RunOptions {
            timeout_ms: Some(50),
            annotate: true,
            document_order: true,
            ..Default::default()
        };

        let config = apply_run_options(config, &options);
        assert_eq!(config.timeout_ms, Some(50));
        assert_eq!(config.max_workers, Some(8));
        assert!(config.annotate_failures);
        assert_eq!(config.ordering, OutputOrdering::Document);
    }

    #[test]
    fn test_explicit_config_must_parse() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config(temp_dir.path(), Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }
}
