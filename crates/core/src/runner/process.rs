use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::Result,
    recipe::{CompiledRecipe, InterpretedRecipe, Recipe, render_command},
    types::{ExecutionResult, FailureKind, Segment},
};

use super::workspace::ArtifactWorkspace;

/// How one child process ended.
#[derive(Debug)]
enum Invocation {
    Finished(Output),
    LaunchFailed { program: String, error: io::Error },
    WaitFailed(io::Error),
    TimedOut,
    Cancelled,
}

/// Materializes a fragment into temporary files and runs its toolchain.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(timeout: Duration, scratch_dir: PathBuf) -> Self {
        Self {
            timeout,
            scratch_dir,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.timeout(), config.scratch_dir())
    }

    /// Run one fragment.
    ///
    /// Per-fragment problems come back as a failed [`ExecutionResult`]; only a
    /// workspace that cannot be created or written is an `Err`.
    pub async fn run(
        &self,
        segment: Segment,
        recipe: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        if cancel.is_cancelled() {
            return Ok(ExecutionResult::failure(segment, FailureKind::Cancelled));
        }
        debug!("Running {} as {}", segment.label(), recipe.mode_name());

        let result = match recipe {
            Recipe::Inert { label } => {
                let stdout = format!("{label}\n{}\n", segment.code);
                ExecutionResult::success(segment, stdout, String::new())
            }
            Recipe::Interpreted(interpreted) => {
                let workspace = ArtifactWorkspace::create(&self.scratch_dir, segment.tag)?;
                let result = self
                    .run_interpreted(segment, interpreted, &workspace, cancel)
                    .await;
                workspace.close();
                result?
            }
            Recipe::Compiled(compiled) => {
                let workspace = ArtifactWorkspace::create(&self.scratch_dir, segment.tag)?;
                let result = self
                    .run_compiled(segment, compiled, &workspace, cancel)
                    .await;
                workspace.close();
                result?
            }
        };

        if let Some(failure) = &result.failure {
            debug!("{} failed: {}", result.segment.label(), failure);
        }
        Ok(result)
    }

    async fn run_interpreted(
        &self,
        segment: Segment,
        recipe: &InterpretedRecipe,
        workspace: &ArtifactWorkspace,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        let deadline = Instant::now() + self.timeout;
        let source = workspace
            .write_source(&recipe.extension, &recipe.source_text(&segment.code))
            .await?;
        let argv = render_command(&recipe.command, &source, None, workspace.path());

        Ok(match invoke(&argv, deadline, cancel).await {
            Invocation::Finished(output) => finished(segment, output),
            other => self.abnormal(segment, other),
        })
    }

    async fn run_compiled(
        &self,
        segment: Segment,
        recipe: &CompiledRecipe,
        workspace: &ArtifactWorkspace,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        let deadline = Instant::now() + self.timeout;
        let source = workspace
            .write_source(&recipe.extension, &recipe.source_text(&segment.code))
            .await?;
        let artifact = workspace.artifact_path(recipe.artifact_extension.as_deref());

        let compile = render_command(&recipe.compile, &source, Some(&artifact), workspace.path());
        let compiled = match invoke(&compile, deadline, cancel).await {
            Invocation::Finished(output) => output,
            other => return Ok(self.abnormal(segment, other)),
        };

        let diagnostics = compiler_diagnostics(&compiled);
        let artifact_missing = !artifact_exists(&artifact).await;
        if !compiled.status.success() || artifact_missing {
            let kind = FailureKind::CompileFailure {
                exit_code: compiled.status.code(),
                artifact_missing,
            };
            return Ok(ExecutionResult::failure(segment, kind).with_output(String::new(), diagnostics));
        }

        let run = render_command(&recipe.run, &source, Some(&artifact), workspace.path());
        Ok(match invoke(&run, deadline, cancel).await {
            Invocation::Finished(output) => finished(segment, output),
            other => self.abnormal(segment, other),
        })
    }

    fn abnormal(&self, segment: Segment, invocation: Invocation) -> ExecutionResult {
        let kind = match invocation {
            Invocation::LaunchFailed { program, error } => {
                debug!("Could not launch '{}': {}", program, error);
                FailureKind::ToolchainNotFound { program }
            }
            Invocation::WaitFailed(error) => {
                warn!("Lost track of child for {}: {}", segment.label(), error);
                FailureKind::RuntimeFailure { exit_code: None }
            }
            Invocation::TimedOut => {
                warn!(
                    "{} exceeded {}ms and was killed",
                    segment.label(),
                    self.timeout.as_millis()
                );
                FailureKind::TimedOut {
                    after: self.timeout,
                }
            }
            Invocation::Cancelled => FailureKind::Cancelled,
            Invocation::Finished(output) => return finished(segment, output),
        };
        ExecutionResult::failure(segment, kind)
    }
}

fn finished(segment: Segment, output: Output) -> ExecutionResult {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if output.status.success() {
        ExecutionResult::success(segment, stdout, stderr)
    } else {
        let kind = FailureKind::RuntimeFailure {
            exit_code: output.status.code(),
        };
        ExecutionResult::failure(segment, kind).with_output(stdout, stderr)
    }
}

fn compiler_diagnostics(output: &Output) -> String {
    let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
    diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
    diagnostics
}

async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Spawn `argv` and wait for it, racing the deadline and the cancellation token.
///
/// On unix the child leads its own process group, and losing the race kills
/// the whole group so helpers it started (a compiler's backend, a script's
/// background jobs) die with it. `kill_on_drop` covers the direct child
/// everywhere else.
async fn invoke(argv: &[String], deadline: Instant, cancel: &CancellationToken) -> Invocation {
    let Some((program, args)) = argv.split_first() else {
        return Invocation::LaunchFailed {
            program: String::new(),
            error: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
        };
    };

    debug!("Invoking: {}", argv.join(" "));
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(error) => {
            return Invocation::LaunchFailed {
                program: program.clone(),
                error,
            };
        }
    };

    let leader = child.id();
    // the child stays unreaped while `wait` is alive, so its pid still names the group
    let wait = child.wait_with_output();
    tokio::pin!(wait);

    tokio::select! {
        output = &mut wait => match output {
            Ok(output) => Invocation::Finished(output),
            Err(error) => Invocation::WaitFailed(error),
        },
        _ = tokio::time::sleep_until(deadline) => {
            kill_process_group(leader);
            Invocation::TimedOut
        }
        _ = cancel.cancelled() => {
            kill_process_group(leader);
            Invocation::Cancelled
        }
    }
}

#[cfg(unix)]
fn kill_process_group(leader: Option<u32>) {
    let Some(pgid) = leader.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: kill(2) with a negative pid only signals the group; no memory is shared
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "Could not signal process group {}: {}",
            pgid,
            io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_leader: Option<u32>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        recipe::RecipeRegistry,
        types::{Position, Tag},
    };
    use tempfile::TempDir;

    fn segment(tag: Tag, code: &str) -> Segment {
        Segment {
            tag,
            code: code.to_string(),
            position: Position {
                offset: 0,
                line: 1,
                column: 1,
            },
            ordinal: 0,
        }
    }

    fn sh_interpreted() -> Recipe {
        Recipe::Interpreted(InterpretedRecipe {
            extension: "sh".to_string(),
            command: vec!["sh".to_string(), "{source}".to_string()],
            wrapper: None,
        })
    }

    /// A "compiler" that copies the wrapped source to the artifact path.
    fn sh_compiled(compile: &[&str]) -> Recipe {
        Recipe::Compiled(CompiledRecipe {
            extension: "sh".to_string(),
            wrapper: "set -e\n{code}\n".to_string(),
            compile: compile.iter().map(|s| s.to_string()).collect(),
            run: vec!["sh".to_string(), "{artifact}".to_string()],
            artifact_extension: Some("out".to_string()),
        })
    }

    fn runner(scratch: &TempDir, timeout: Duration) -> ProcessRunner {
        ProcessRunner::new(timeout, scratch.path().to_path_buf())
    }

    fn assert_scratch_empty(scratch: &TempDir) {
        let leftovers: Vec<_> = std::fs::read_dir(scratch.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "leftover artifacts: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_inert_echoes_under_label() {
        let scratch = TempDir::new().unwrap();
        let registry = RecipeRegistry::builtin();
        let result = runner(&scratch, Duration::from_secs(5))
            .run(
                segment(Tag::Css, "body { margin: 0; }"),
                registry.recipe_for(Tag::Css),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.stdout, "[Styling Loaded]\nbody { margin: 0; }\n");
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_interpreted_success() {
        let scratch = TempDir::new().unwrap();
        let result = runner(&scratch, Duration::from_secs(10))
            .run(segment(Tag::Python, "echo 2"), &sh_interpreted(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.stdout, "2\n");
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_runtime_failure_keeps_stdout() {
        let scratch = TempDir::new().unwrap();
        let result = runner(&scratch, Duration::from_secs(10))
            .run(
                segment(Tag::Python, "echo before\necho oops >&2\nexit 3"),
                &sh_interpreted(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert_eq!(result.failure, Some(FailureKind::RuntimeFailure { exit_code: Some(3) }));
        assert_eq!(result.stdout, "before\n");
        assert_eq!(result.stderr, "oops\n");
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_missing_toolchain() {
        let scratch = TempDir::new().unwrap();
        let recipe = Recipe::Interpreted(InterpretedRecipe {
            extension: "py".to_string(),
            command: vec!["m5r-no-such-interpreter".to_string(), "{source}".to_string()],
            wrapper: None,
        });
        let result = runner(&scratch, Duration::from_secs(5))
            .run(segment(Tag::Python, "print(1)"), &recipe, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.failure,
            Some(FailureKind::ToolchainNotFound {
                program: "m5r-no-such-interpreter".to_string()
            })
        );
        assert!(result.stdout.is_empty());
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_compile_then_run() {
        let scratch = TempDir::new().unwrap();
        let recipe = sh_compiled(&["cp", "{source}", "{artifact}"]);
        let result = runner(&scratch, Duration::from_secs(10))
            .run(segment(Tag::Cpp, "printf hi"), &recipe, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.succeeded, "{result:?}");
        assert_eq!(result.stdout, "hi");
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_compile_failure_skips_run() {
        let scratch = TempDir::new().unwrap();
        let recipe = sh_compiled(&["sh", "-c", "echo 'error: expected ;' >&2; exit 1"]);
        let result = runner(&scratch, Duration::from_secs(10))
            .run(segment(Tag::Cpp, "printf hi"), &recipe, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.failure,
            Some(FailureKind::CompileFailure {
                exit_code: Some(1),
                artifact_missing: true
            })
        );
        assert!(result.stdout.is_empty());
        assert!(result.stderr.contains("expected ;"));
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_a_compile_failure() {
        let scratch = TempDir::new().unwrap();
        let recipe = sh_compiled(&["true"]);
        let result = runner(&scratch, Duration::from_secs(10))
            .run(segment(Tag::CSharp, "printf hi"), &recipe, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.failure,
            Some(FailureKind::CompileFailure {
                exit_code: Some(0),
                artifact_missing: true
            })
        );
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_timeout_kills_and_cleans_up() {
        let scratch = TempDir::new().unwrap();
        let timeout = Duration::from_millis(200);
        let started = std::time::Instant::now();
        let result = runner(&scratch, timeout)
            .run(segment(Tag::Python, "sleep 30"), &sh_interpreted(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.failure, Some(FailureKind::TimedOut { after: timeout }));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_scratch_empty(&scratch);
    }

    /// Whether `pid` is alive and not a zombie waiting to be reaped.
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| !rest.trim_start().starts_with('Z')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    async fn assert_gone(pid: &str) {
        for _ in 0..40 {
            if !is_running(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("background process {pid} outlived its fragment");
    }

    /// Fragment that starts a background `sleep`, records its pid and waits.
    #[cfg(target_os = "linux")]
    fn spawns_background_job(pid_file: &Path) -> Segment {
        let code = format!("sleep 30 &\necho $! > {}\nwait", pid_file.display());
        segment(Tag::Python, &code)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_background_jobs() {
        let scratch = TempDir::new().unwrap();
        let pids = TempDir::new().unwrap();
        let pid_file = pids.path().join("job.pid");

        let result = runner(&scratch, Duration::from_millis(500))
            .run(spawns_background_job(&pid_file), &sh_interpreted(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(result.failure, Some(FailureKind::TimedOut { .. })));
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert_gone(pid.trim()).await;
        assert_scratch_empty(&scratch);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_cancellation_kills_background_jobs() {
        let scratch = TempDir::new().unwrap();
        let pids = TempDir::new().unwrap();
        let pid_file = pids.path().join("job.pid");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let result = runner(&scratch, Duration::from_secs(30))
            .run(spawns_background_job(&pid_file), &sh_interpreted(), &cancel)
            .await
            .unwrap();

        assert_eq!(result.failure, Some(FailureKind::Cancelled));
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert_gone(pid.trim()).await;
    }

    #[tokio::test]
    async fn test_cancellation() {
        let scratch = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = runner(&scratch, Duration::from_secs(30))
            .run(segment(Tag::Python, "sleep 30"), &sh_interpreted(), &cancel)
            .await
            .unwrap();

        assert_eq!(result.failure, Some(FailureKind::Cancelled));
        assert_scratch_empty(&scratch);
    }

    #[tokio::test]
    async fn test_unwritable_scratch_dir_aborts() {
        let scratch = TempDir::new().unwrap();
        let runner = ProcessRunner::new(Duration::from_secs(1), scratch.path().join("missing"));
        let err = runner
            .run(segment(Tag::Python, "echo 1"), &sh_interpreted(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::WorkspaceError { .. }));
    }
}
