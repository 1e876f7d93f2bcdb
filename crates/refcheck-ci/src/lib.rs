//! refcheck CI - reference solution checks for exercise tracks
//!
//! Provides the test pipeline that:
//! - Stages a disposable workspace per exercise with the reference
//!   implementation substituted for the learner stub
//! - Runs the track's test-runner image against it in a locked-down container
//! - Classifies the harness verdict and aggregates a run report
//! - Evaluates the run gate that decides the exit status

pub mod classify;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod runner;
pub mod stage;

// Re-export key types
pub use classify::{classify, Category, Classification, TestIssue};
pub use error::{PipelineError, RunnerError, StageError};
pub use gate::{GateVerdict, RunGate};
pub use pipeline::{
    ExerciseOutcome, ExerciseReport, KindReport, RefPipeline, RunOptions, RunReport, SkipReason,
    SummaryRow,
};
pub use runner::{ContainerRunner, HarnessConfig, HarnessRun, HarnessRunner};
pub use stage::{plan_copies, CopyOp, FileRole, FsStager, Workspace, WorkspaceStager};
