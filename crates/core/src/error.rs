use std::io;
use std::path::PathBuf;

/// Errors that abort a whole m5r run.
///
/// Per-fragment problems (missing toolchain, compile or runtime failure,
/// timeouts) are never reported through this type; they are recorded on the
/// fragment's [`ExecutionResult`](crate::types::ExecutionResult) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Could not create temporary workspace in {}: {source}", path.display())]
    WorkspaceError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Pattern error: {0}")]
    PatternError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Worker error: {0}")]
    WorkerError(String),
}

/// Result type alias for m5r operations
pub type Result<T> = std::result::Result<T, Error>;
