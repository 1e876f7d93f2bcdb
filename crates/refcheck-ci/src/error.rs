//! Error types for staging, harness execution and the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use refcheck_core::CatalogError;

/// Errors produced while staging an exercise workspace.
///
/// Recoverable: the exercise is reported as a harness error and the run
/// continues.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to create workspace under {root}: {source}")]
    CreateWorkspace {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsafe path in exercise metadata: {path:?}")]
    UnsafePath { path: String },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced by the harness runner.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to launch {engine}: {source}")]
    Spawn {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare test runner image {image} (exit code {exit_code}): {stderr}")]
    Prepare {
        image: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("test runner exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        exit_code: i32,
        stderr: String,
        elapsed: Duration,
    },

    /// Only the engine client is killed; the container itself may keep
    /// running until the engine reaps it.
    #[error("test runner timed out after {limit_secs} seconds (container may still be running)")]
    Timeout { limit_secs: u64 },

    #[error("test runner produced no results at {path}: {source}")]
    MissingResults {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        elapsed: Duration,
    },

    #[error("test runner produced malformed results at {path}: {source}")]
    MalformedResults {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
        elapsed: Duration,
    },
}

impl RunnerError {
    /// Wall-clock time the harness ran before the error, when it ran at all.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            RunnerError::NonZeroExit { elapsed, .. }
            | RunnerError::MissingResults { elapsed, .. }
            | RunnerError::MalformedResults { elapsed, .. } => Some(*elapsed),
            RunnerError::Timeout { limit_secs } => Some(Duration::from_secs(*limit_secs)),
            RunnerError::Spawn { .. } | RunnerError::Prepare { .. } => None,
        }
    }
}

/// Errors that abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("test runner preparation failed: {0}")]
    Prepare(#[source] RunnerError),
}
