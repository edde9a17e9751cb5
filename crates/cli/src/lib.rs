pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod utils;

// Re-export commonly used items
pub use cli::{Cli, Commands, RunOptions};
