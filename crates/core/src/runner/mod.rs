//! Process Runner: temporary artifacts plus toolchain invocation.

pub mod process;
pub mod workspace;

pub use process::ProcessRunner;
pub use workspace::ArtifactWorkspace;
