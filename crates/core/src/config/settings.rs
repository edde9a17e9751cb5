use crate::{
    error::{Error, Result},
    impl_case_insensitive_deserialize,
    types::Tag,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ToolchainOverride;

/// Names checked when looking for a config file next to a document.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".m5r.json", "m5r.json"];

pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Order in which fragment outputs are concatenated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputOrdering {
    /// All fragments of the first tag, then all of the next, ...
    #[default]
    TagGroup,
    /// Position in the source document
    Document,
}

impl_case_insensitive_deserialize!(
    OutputOrdering,
    TagGroup => "tag_group",
    Document => "document"
);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Per-fragment wall-clock limit, covering compile and run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Upper bound on fragments executing at once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Prefix failed fragments' output with a marker line
    #[serde(default)]
    pub annotate_failures: bool,
    #[serde(default)]
    pub ordering: OutputOrdering,
    /// Directory that receives the per-fragment temporary directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub toolchains: BTreeMap<Tag, ToolchainOverride>,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Walk up from `start_path` looking for `.m5r.json` or `m5r.json`.
    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Load the nearest config file above `start_path`, or the defaults.
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == Some(0) {
            return Err(Error::ConfigError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_workers == Some(0) {
            return Err(Error::ConfigError(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        for (tag, toolchain) in &self.toolchains {
            for (field, argv) in [
                ("command", &toolchain.command),
                ("compile", &toolchain.compile),
                ("run", &toolchain.run),
            ] {
                if argv.as_ref().is_some_and(|argv| argv.is_empty()) {
                    return Err(Error::ConfigError(format!(
                        "toolchains.{tag}.{field} must name a program"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn with_toolchain(mut self, tag: Tag, toolchain: ToolchainOverride) -> Self {
        self.toolchains.insert(tag, toolchain);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            timeout_ms: Some(1500),
            max_workers: Some(2),
            annotate_failures: true,
            ordering: OutputOrdering::Document,
            ..Default::default()
        }
        .with_toolchain(Tag::Python, ToolchainOverride::interpreter(["python3.12", "{source}"]));

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.timeout_ms, Some(1500));
        assert_eq!(parsed.ordering, OutputOrdering::Document);
        assert!(parsed.annotate_failures);
        assert_eq!(
            parsed.toolchains[&Tag::Python].command,
            Some(vec!["python3.12".to_string(), "{source}".to_string()])
        );
    }

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.ordering, OutputOrdering::TagGroup);
        assert!(!config.annotate_failures);
        assert!(config.max_workers() >= 1);
    }

    #[test]
    fn test_ordering_is_case_insensitive() {
        let config: Config = serde_json::from_str(r#"{"ordering": "Document"}"#).unwrap();
        assert_eq!(config.ordering, OutputOrdering::Document);
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let config = Config::default().with_toolchain(
            Tag::Cpp,
            ToolchainOverride {
                compile: Some(Vec::new()),
                ..Default::default()
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("toolchains.cpp.compile"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = Config {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("scripts").join("demo");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp_dir.path().join(".m5r.json"), r#"{"timeout_ms": 10}"#).unwrap();

        let found = Config::find_config_file(&nested).unwrap();
        assert_eq!(found, temp_dir.path().join(".m5r.json"));

        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.timeout_ms, Some(10));
    }
}
