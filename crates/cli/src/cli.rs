use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "m5r")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every fragment of a .m5r document and print the combined output
    #[command(visible_alias = "r")]
    Run {
        /// Path to the .m5r document
        filepath: String,

        #[command(flatten)]
        options: RunOptions,
    },
    /// List the fragments of a document without running them
    #[command(visible_alias = "a")]
    Analyze {
        /// Path to the .m5r document
        filepath: String,

        /// Print the extraction as JSON
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the toolchain behind each tag and whether it is installed
    Toolchains {
        /// Directory to look for a config file in (defaults to current directory)
        #[arg(long)]
        cwd: Option<String>,
    },
    /// Write a default .m5r.json configuration
    Init {
        /// Specify the current working directory
        #[arg(short, long)]
        cwd: Option<String>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Flags that override the discovered config file for one run.
#[derive(Args, Debug, Default, Clone)]
pub struct RunOptions {
    /// Use this config file instead of searching for .m5r.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-fragment time limit in milliseconds
    #[arg(short, long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Maximum number of fragments running at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Mark failed fragments in the output
    #[arg(short, long)]
    pub annotate: bool,

    /// Print outputs in document order instead of grouped by tag
    #[arg(long)]
    pub document_order: bool,

    /// Print the full run report as JSON
    #[arg(long)]
    pub json: bool,
}
