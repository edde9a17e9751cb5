use anyhow::Result;
use clap::Parser;

use m5r_cli::{
    Cli, Commands,
    commands::{analyze_command, init_command, run_command, toolchains_command},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing based on RUST_LOG env var; stdout carries program output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { filepath, options } => run_command(&filepath, &options).await,
        Commands::Analyze { filepath, verbose } => analyze_command(&filepath, verbose),
        Commands::Toolchains { cwd } => toolchains_command(cwd.as_deref()),
        Commands::Init { cwd, force } => init_command(cwd.as_deref(), force),
    }
}
