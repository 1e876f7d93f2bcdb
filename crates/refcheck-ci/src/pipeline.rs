//! Test pipeline orchestration.
//!
//! For every requested kind the exercises are sorted by display name, the
//! skip policy is applied, and the remaining exercises are staged, run and
//! classified as one task each. Report order is fixed before any task runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use refcheck_core::{Catalog, Exercise, ExerciseKind, ExerciseStatus, NameOrder};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::classify::{classify, Classification};
use crate::error::PipelineError;
use crate::runner::HarnessRunner;
use crate::stage::WorkspaceStager;

/// Options controlling which exercises run and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOptions {
    /// Kinds to test; reported in `ExerciseKind` order.
    pub kinds: Vec<ExerciseKind>,

    /// Test work-in-progress exercises instead of skipping them.
    pub include_wip: bool,

    /// Test deprecated exercises instead of skipping them.
    pub include_deprecated: bool,

    /// Fail the run on test failures, not only on harness errors.
    pub fail_on_test_failure: bool,

    /// Maximum number of exercises staged or executing at once.
    pub concurrency: usize,

    /// Restrict the run to these slugs (empty = all).
    pub exercises: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            kinds: ExerciseKind::ALL.to_vec(),
            include_wip: false,
            include_deprecated: false,
            fail_on_test_failure: false,
            concurrency: 1,
            exercises: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Skip reason for `exercise`, if the policy skips it.
    pub fn skip_reason(&self, exercise: &Exercise) -> Option<SkipReason> {
        match exercise.status() {
            ExerciseStatus::WorkInProgress if !self.include_wip => {
                Some(SkipReason::WorkInProgress)
            }
            ExerciseStatus::Deprecated if !self.include_deprecated => Some(SkipReason::Deprecated),
            _ => None,
        }
    }

    fn selects(&self, exercise: &Exercise) -> bool {
        self.exercises.is_empty() || self.exercises.iter().any(|s| s == exercise.slug())
    }

    fn requested_kinds(&self) -> Vec<ExerciseKind> {
        let mut kinds = self.kinds.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

/// Why an exercise was not tested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    WorkInProgress,
    Deprecated,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::WorkInProgress => "work-in-progress",
            SkipReason::Deprecated => "deprecated",
        }
    }
}

/// Terminal state of one exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExerciseOutcome {
    Skipped {
        reason: SkipReason,
    },
    Evaluated {
        classification: Classification,
        /// Harness wall-clock time; absent when the harness never ran.
        duration: Option<Duration>,
    },
}

/// Report entry for one exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseReport {
    pub slug: String,
    pub name: String,
    pub kind: ExerciseKind,
    pub outcome: ExerciseOutcome,
}

impl ExerciseReport {
    pub fn classification(&self) -> Option<&Classification> {
        match &self.outcome {
            ExerciseOutcome::Evaluated { classification, .. } => Some(classification),
            ExerciseOutcome::Skipped { .. } => None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match &self.outcome {
            ExerciseOutcome::Evaluated { duration, .. } => *duration,
            ExerciseOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_harness_error(&self) -> bool {
        self.classification()
            .is_some_and(|c| c.category.is_harness_error())
    }

    /// Executed with results, but not every test passed.
    pub fn has_test_failures(&self) -> bool {
        self.classification().is_some_and(|c| {
            !c.category.is_success() && !c.category.is_harness_error()
        })
    }

    pub fn status_label(&self) -> String {
        match &self.outcome {
            ExerciseOutcome::Skipped { reason } => format!("Skipped: {}", reason.as_str()),
            ExerciseOutcome::Evaluated { classification, .. } => classification.category.label(),
        }
    }

    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            name: self.name.clone(),
            status: self.status_label(),
            duration_ms: self.duration().map(|d| d.as_secs_f64() * 1000.0),
        }
    }
}

/// One row of the summary table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub status: String,
    pub duration_ms: Option<f64>,
}

/// All exercises of one kind, sorted by display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindReport {
    pub kind: ExerciseKind,
    pub exercises: Vec<ExerciseReport>,
}

impl KindReport {
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.exercises.iter().map(ExerciseReport::summary_row).collect()
    }

    pub fn harness_errors(&self) -> impl Iterator<Item = &ExerciseReport> {
        self.exercises.iter().filter(|e| e.is_harness_error())
    }

    pub fn test_failures(&self) -> impl Iterator<Item = &ExerciseReport> {
        self.exercises.iter().filter(|e| e.has_test_failures())
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub kinds: Vec<KindReport>,
}

impl RunReport {
    pub fn exercises(&self) -> impl Iterator<Item = &ExerciseReport> {
        self.kinds.iter().flat_map(|k| k.exercises.iter())
    }

    pub fn kind(&self, kind: ExerciseKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

/// A queued exercise: either decided up front or running as a task.
enum Slot {
    Skipped(SkipReason),
    Running(JoinHandle<ExerciseOutcome>),
}

/// Reference solution test pipeline.
pub struct RefPipeline {
    stager: Arc<dyn WorkspaceStager>,
    runner: Arc<dyn HarnessRunner>,
    options: RunOptions,
}

impl RefPipeline {
    pub fn new(
        stager: Arc<dyn WorkspaceStager>,
        runner: Arc<dyn HarnessRunner>,
        options: RunOptions,
    ) -> Self {
        Self {
            stager,
            runner,
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Read the requested kinds from `catalog` and test them.
    ///
    /// Catalog errors are fatal and surface before the runner is prepared.
    pub async fn run(&self, catalog: &Catalog) -> Result<RunReport, PipelineError> {
        let groups = self
            .options
            .requested_kinds()
            .into_iter()
            .map(|kind| catalog.for_kind(kind).map(|exercises| (kind, exercises)))
            .collect::<Result<Vec<_>, _>>()?;
        self.run_exercises(groups).await
    }

    /// Test already-resolved exercises grouped by kind.
    ///
    /// Groups of kinds that were not requested are ignored. The runner is
    /// prepared exactly once before any exercise executes; a preparation
    /// failure aborts the run.
    pub async fn run_exercises(
        &self,
        groups: Vec<(ExerciseKind, Vec<Exercise>)>,
    ) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let groups = {
            let order = NameOrder::default();
            let mut groups: Vec<(ExerciseKind, Vec<Exercise>)> = groups
                .into_iter()
                .filter(|(kind, _)| self.options.kinds.contains(kind))
                .map(|(kind, exercises)| {
                    let mut selected: Vec<Exercise> = exercises
                        .into_iter()
                        .filter(|e| self.options.selects(e))
                        .collect();
                    order.sort(&mut selected);
                    (kind, selected)
                })
                .collect();
            groups.sort_by_key(|(kind, _)| *kind);
            groups
        };

        info!("Preparing test runner");
        self.runner.prepare().await.map_err(PipelineError::Prepare)?;

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut queued: Vec<(ExerciseKind, Vec<(Exercise, Slot)>)> = Vec::new();
        for (kind, exercises) in groups {
            let slots = exercises
                .into_iter()
                .map(|exercise| {
                    let slot = match self.options.skip_reason(&exercise) {
                        Some(reason) => {
                            info!(
                                "Skipping {} exercise: {}",
                                reason.as_str(),
                                exercise.name()
                            );
                            Slot::Skipped(reason)
                        }
                        None => Slot::Running(self.spawn_exercise(exercise.clone(), &semaphore)),
                    };
                    (exercise, slot)
                })
                .collect();
            queued.push((kind, slots));
        }

        // Awaiting in queue order keeps the report order independent of
        // completion order.
        let mut kinds = Vec::with_capacity(queued.len());
        for (kind, slots) in queued {
            let mut exercises = Vec::with_capacity(slots.len());
            for (exercise, slot) in slots {
                let outcome = match slot {
                    Slot::Skipped(reason) => ExerciseOutcome::Skipped { reason },
                    Slot::Running(handle) => match handle.await {
                        Ok(outcome) => outcome,
                        Err(join_err) => {
                            error!(exercise = %exercise.name(), "Exercise task failed: {join_err}");
                            ExerciseOutcome::Evaluated {
                                classification: Classification::harness_error(format!(
                                    "exercise task failed: {join_err}"
                                )),
                                duration: None,
                            }
                        }
                    },
                };
                exercises.push(ExerciseReport {
                    slug: exercise.slug().to_string(),
                    name: exercise.name().to_string(),
                    kind,
                    outcome,
                });
            }
            kinds.push(KindReport { kind, exercises });
        }

        Ok(RunReport {
            started_at,
            duration: start.elapsed(),
            kinds,
        })
    }

    fn spawn_exercise(
        &self,
        exercise: Exercise,
        semaphore: &Arc<Semaphore>,
    ) -> JoinHandle<ExerciseOutcome> {
        let stager = Arc::clone(&self.stager);
        let runner = Arc::clone(&self.runner);
        let semaphore = Arc::clone(semaphore);

        tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return ExerciseOutcome::Evaluated {
                        classification: Classification::harness_error(e.to_string()),
                        duration: None,
                    }
                }
            };
            test_exercise(stager.as_ref(), runner.as_ref(), &exercise).await
        })
    }
}

/// Stage, execute and classify a single exercise.
///
/// Never fails: staging and harness errors become a harness-error
/// classification for this exercise only.
pub async fn test_exercise(
    stager: &dyn WorkspaceStager,
    runner: &dyn HarnessRunner,
    exercise: &Exercise,
) -> ExerciseOutcome {
    info!(kind = %exercise.kind, "Testing exercise: {}", exercise.name());

    let workspace = match stager.stage(exercise).await {
        Ok(workspace) => workspace,
        Err(e) => {
            error!(exercise = %exercise.name(), "Failed to stage workspace: {e}");
            return ExerciseOutcome::Evaluated {
                classification: Classification::harness_error(e.to_string()),
                duration: None,
            };
        }
    };

    let outcome = match runner.run(exercise.slug(), workspace.path()).await {
        Ok(run) => {
            let classification = classify(&run.verdict);
            if classification.category.is_harness_error() {
                error!(exercise = %exercise.name(), "Test runner reported an error");
            } else if !classification.category.is_success() {
                warn!(
                    exercise = %exercise.name(),
                    status = %classification.category.label(),
                    "Reference solution did not pass every test"
                );
            }
            ExerciseOutcome::Evaluated {
                classification,
                duration: Some(run.duration),
            }
        }
        Err(e) => {
            error!(exercise = %exercise.name(), "Error while running tests: {e}");
            ExerciseOutcome::Evaluated {
                duration: e.elapsed(),
                classification: Classification::harness_error(e.to_string()),
            }
        }
    };

    drop(workspace);
    outcome
}
