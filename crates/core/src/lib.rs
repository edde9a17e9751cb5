//! m5r-core - execution engine for polyglot `.m5r` documents
//!
//! A document embeds code fragments tagged with a language marker
//! (`<?py ... ?>`, `<?js ... ?>`, `<?php ... ?>`, `<?css ... ?>`,
//! `<?cs ... ?>`, `<?cpp ... ?>`). This crate provides functionality to:
//! - Extract the fragments, grouped by tag
//! - Map each tag to an interpret, compile-then-run or echo recipe
//! - Run each fragment through its external toolchain in a private
//!   temporary workspace, with a per-fragment timeout and cancellation
//! - Combine the captured output into a single string
pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod recipe;
pub mod runner;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use types::*;

// Re-export main API components
pub use config::{Config, OutputOrdering, ToolchainOverride};
pub use engine::Engine;
pub use extractor::{Extraction, SegmentExtractor, extract};
pub use recipe::{Recipe, RecipeRegistry};
pub use runner::ProcessRunner;

pub use tokio_util::sync::CancellationToken;
