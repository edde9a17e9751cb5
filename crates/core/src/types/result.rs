use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::segment::{Segment, UnterminatedFragment};

/// Why a single fragment did not finish cleanly.
///
/// None of these abort the run; they only mark the fragment they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The interpreter or compiler could not be launched
    ToolchainNotFound { program: String },
    /// The compiler exited non-zero or left no build artifact behind
    CompileFailure {
        exit_code: Option<i32>,
        artifact_missing: bool,
    },
    /// The interpreter or compiled program exited non-zero
    RuntimeFailure { exit_code: Option<i32> },
    TimedOut { after: Duration },
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ToolchainNotFound { program } => {
                write!(f, "toolchain not found ({program})")
            }
            FailureKind::CompileFailure {
                artifact_missing: true,
                ..
            } => write!(f, "compile failure (no build artifact)"),
            FailureKind::CompileFailure { exit_code, .. } => {
                write!(f, "compile failure ({})", describe_exit(*exit_code))
            }
            FailureKind::RuntimeFailure { exit_code } => {
                write!(f, "runtime failure ({})", describe_exit(*exit_code))
            }
            FailureKind::TimedOut { after } => write!(f, "timed out after {}ms", after.as_millis()),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Outcome of running one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub segment: Segment,
    pub stdout: String,
    /// Captured for diagnostics, never part of the combined output
    pub stderr: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ExecutionResult {
    pub fn success(segment: Segment, stdout: String, stderr: String) -> Self {
        Self {
            segment,
            stdout,
            stderr,
            succeeded: true,
            failure: None,
        }
    }

    pub fn failure(segment: Segment, kind: FailureKind) -> Self {
        Self {
            segment,
            stdout: String::new(),
            stderr: String::new(),
            succeeded: false,
            failure: Some(kind),
        }
    }

    pub fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutput {
    /// Combined stdout of every fragment, in aggregation order
    pub output: String,
    /// Per-fragment results, in aggregation order
    pub results: Vec<ExecutionResult>,
    /// Openers that had no closing marker and were skipped
    pub unterminated: Vec<UnterminatedFragment>,
}

impl RunOutput {
    pub fn failures(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }
}
