//! Configuration management for m5r

mod settings;
pub mod toolchain;

// Re-export main types
pub use settings::{CONFIG_FILE_NAMES, Config, DEFAULT_TIMEOUT_MS, OutputOrdering};
pub use toolchain::ToolchainOverride;
