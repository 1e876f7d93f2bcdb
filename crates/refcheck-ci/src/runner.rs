//! Sandboxed harness execution.
//!
//! The track's test runner is an opaque container image invoked as
//! `<image> <slug> /solution /output`. The staged workspace is bind-mounted
//! at both paths, `/tmp` is a private tmpfs and networking is disabled.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use refcheck_core::HarnessVerdict;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::RunnerError;

/// Mount point of the workspace the harness reads the solution from.
pub const SOLUTION_MOUNT: &str = "/solution";

/// Mount point of the workspace the harness writes results to.
pub const OUTPUT_MOUNT: &str = "/output";

/// File the harness writes its verdict to, relative to the output mount.
pub const RESULTS_FILE: &str = "results.json";

/// Maximum number of stderr lines carried in an error.
const STDERR_TAIL_LINES: usize = 20;

/// Configuration of the harness container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Test runner image, e.g. `exercism/python-test-runner`.
    pub image: String,

    /// Container engine executable (`docker`, `podman`, ...).
    pub engine: String,

    /// Whether to pull the image before the run.
    pub pull: bool,

    /// Per-exercise timeout in seconds (0 = none).
    pub timeout_secs: u64,
}

impl HarnessConfig {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            engine: "docker".to_string(),
            pull: true,
            timeout_secs: 0,
        }
    }
}

/// Verdict of one harness invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessRun {
    pub verdict: HarnessVerdict,

    /// Wall-clock time from launch to process exit.
    pub duration: Duration,
}

/// Executes the test harness against a staged workspace.
#[async_trait]
pub trait HarnessRunner: Send + Sync {
    /// One-time preparation before any exercise runs (e.g. pulling the image).
    async fn prepare(&self) -> Result<(), RunnerError>;

    /// Run the harness for `slug` against `workspace`.
    async fn run(&self, slug: &str, workspace: &Path) -> Result<HarnessRun, RunnerError>;
}

/// Runs the harness through a Docker-compatible container engine.
#[derive(Debug, Clone)]
pub struct ContainerRunner {
    config: HarnessConfig,
}

impl ContainerRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Arguments for pulling the image.
    pub fn pull_args(&self) -> Vec<String> {
        vec!["pull".to_string(), self.config.image.clone()]
    }

    /// Arguments for running the harness against `workspace`.
    pub fn run_args(&self, slug: &str, workspace: &Path) -> Vec<String> {
        let src = workspace.display();
        vec![
            "run".to_string(),
            "--rm".to_string(),
            "--network".to_string(),
            "none".to_string(),
            "--mount".to_string(),
            format!("type=bind,src={src},dst={SOLUTION_MOUNT}"),
            "--mount".to_string(),
            format!("type=bind,src={src},dst={OUTPUT_MOUNT}"),
            "--tmpfs".to_string(),
            "/tmp:rw".to_string(),
            self.config.image.clone(),
            slug.to_string(),
            SOLUTION_MOUNT.to_string(),
            OUTPUT_MOUNT.to_string(),
        ]
    }

    fn command(&self, args: &[String]) -> Command {
        debug!(engine = %self.config.engine, ?args, "Running container command");
        let mut command = Command::new(&self.config.engine);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_err(&self, source: std::io::Error) -> RunnerError {
        RunnerError::Spawn {
            engine: self.config.engine.clone(),
            source,
        }
    }
}

#[async_trait]
impl HarnessRunner for ContainerRunner {
    async fn prepare(&self) -> Result<(), RunnerError> {
        if !self.config.pull {
            debug!(image = %self.config.image, "Skipping image pull");
            return Ok(());
        }

        let output = self
            .command(&self.pull_args())
            .output()
            .await
            .map_err(|e| self.spawn_err(e))?;

        if !output.status.success() {
            return Err(RunnerError::Prepare {
                image: self.config.image.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(())
    }

    async fn run(&self, slug: &str, workspace: &Path) -> Result<HarnessRun, RunnerError> {
        debug!(slug, "Starting test runner");
        let start = Instant::now();

        let child = self
            .command(&self.run_args(slug, workspace))
            .spawn()
            .map_err(|e| self.spawn_err(e))?;

        // Dropping the child on timeout kills the engine client process.
        let waited = if self.config.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| {
                warn!(
                    slug,
                    workspace = %workspace.display(),
                    "Test runner timed out; the container is not stopped and may outlive its workspace"
                );
                RunnerError::Timeout {
                    limit_secs: self.config.timeout_secs,
                }
            })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|e| self.spawn_err(e))?;

        let elapsed = start.elapsed();
        debug!(slug, elapsed_ms = elapsed.as_millis() as u64, "Test runner finished");
        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "Test runner output");

        if !output.status.success() {
            return Err(RunnerError::NonZeroExit {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: stderr_tail(&output.stderr),
                elapsed,
            });
        }

        let verdict = read_verdict(workspace, elapsed).await?;
        Ok(HarnessRun {
            verdict,
            duration: elapsed,
        })
    }
}

/// Read and decode `results.json` from a workspace.
pub async fn read_verdict(workspace: &Path, elapsed: Duration) -> Result<HarnessVerdict, RunnerError> {
    let path = workspace.join(RESULTS_FILE);
    debug!(path = %path.display(), "Reading test results");

    let data = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| RunnerError::MissingResults {
            path: path.clone(),
            source,
            elapsed,
        })?;

    HarnessVerdict::from_json(&data).map_err(|source| RunnerError::MalformedResults {
        path,
        source,
        elapsed,
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
