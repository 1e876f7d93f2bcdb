//! Integration tests for the test pipeline with scripted runners.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use refcheck_ci::{
    Category, ExerciseOutcome, FsStager, HarnessRun, HarnessRunner, PipelineError, RefPipeline,
    RunGate, RunOptions, RunnerError, SkipReason, StageError, Workspace, WorkspaceStager,
};
use refcheck_core::{
    Catalog, Exercise, ExerciseDescriptor, ExerciseFiles, ExerciseKind, ExerciseMetadata,
    ExerciseStatus, HarnessVerdict, TestCaseResult, TestStatus,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Script {
    Verdict(HarnessVerdict),
    Crash,
    Slow(u64),
}

/// Harness runner answering from a per-slug script.
#[derive(Default)]
struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    fail_prepare: bool,
    prepared: AtomicUsize,
    log: Mutex<Vec<String>>,
    workspaces: Mutex<Vec<PathBuf>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedRunner {
    fn with(mut self, slug: &str, script: Script) -> Self {
        self.scripts.insert(slug.to_string(), script);
        self
    }

    fn runs(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| *e != "prepare")
            .cloned()
            .collect()
    }
}

fn passing(count: usize) -> HarnessVerdict {
    HarnessVerdict::Pass {
        tests: (0..count)
            .map(|i| TestCaseResult {
                name: format!("test {i}"),
                status: TestStatus::Pass,
                message: None,
            })
            .collect(),
    }
}

#[async_trait]
impl HarnessRunner for ScriptedRunner {
    async fn prepare(&self) -> Result<(), RunnerError> {
        self.prepared.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push("prepare".to_string());
        if self.fail_prepare {
            return Err(RunnerError::Prepare {
                image: "exercism/missing".to_string(),
                exit_code: 1,
                stderr: "manifest unknown".to_string(),
            });
        }
        Ok(())
    }

    async fn run(&self, slug: &str, workspace: &Path) -> Result<HarnessRun, RunnerError> {
        self.log.lock().unwrap().push(slug.to_string());
        self.workspaces.lock().unwrap().push(workspace.to_path_buf());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        let result = self.play(slug).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl ScriptedRunner {
    async fn play(&self, slug: &str) -> Result<HarnessRun, RunnerError> {
        let script = self
            .scripts
            .get(slug)
            .cloned()
            .unwrap_or(Script::Verdict(passing(1)));
        match script {
            Script::Verdict(verdict) => Ok(HarnessRun {
                verdict,
                duration: Duration::from_millis(25),
            }),
            Script::Crash => Err(RunnerError::NonZeroExit {
                exit_code: 137,
                stderr: "container killed".to_string(),
                elapsed: Duration::from_millis(40),
            }),
            Script::Slow(millis) => {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(HarnessRun {
                    verdict: passing(1),
                    duration: Duration::from_millis(millis),
                })
            }
        }
    }
}

/// Stager creating empty workspaces and counting calls.
struct CountingStager {
    root: tempfile::TempDir,
    calls: AtomicUsize,
    failing: HashSet<String>,
}

impl CountingStager {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            calls: AtomicUsize::new(0),
            failing: HashSet::new(),
        }
    }

    fn failing_on(mut self, slug: &str) -> Self {
        self.failing.insert(slug.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkspaceStager for CountingStager {
    async fn stage(&self, exercise: &Exercise) -> Result<Workspace, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(exercise.slug()) {
            return Err(StageError::Copy {
                from: exercise.path.join("missing.py"),
                to: PathBuf::from("missing.py"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        Workspace::create(self.root.path(), exercise.slug())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn exercise(name: &str, kind: ExerciseKind, status: ExerciseStatus) -> Exercise {
    let slug = name.to_lowercase().replace(' ', "-");
    Exercise {
        descriptor: ExerciseDescriptor {
            uuid: Uuid::new_v4(),
            slug: slug.clone(),
            name: name.to_string(),
            status,
        },
        kind,
        path: PathBuf::from("exercises").join(kind.as_str()).join(&slug),
        metadata: ExerciseMetadata {
            files: ExerciseFiles {
                solution: vec![format!("{slug}.py")],
                test: vec![format!("{slug}_test.py")],
                ..Default::default()
            },
        },
    }
}

fn active(name: &str, kind: ExerciseKind) -> Exercise {
    exercise(name, kind, ExerciseStatus::Active)
}

fn pipeline(
    stager: Arc<CountingStager>,
    runner: Arc<ScriptedRunner>,
    options: RunOptions,
) -> RefPipeline {
    RefPipeline::new(stager, runner, options)
}

fn names(report: &refcheck_ci::KindReport) -> Vec<&str> {
    report.exercises.iter().map(|e| e.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Every exercise fed in has exactly one entry, sorted per kind.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_total_coverage_and_ordering() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default());
    let options = RunOptions {
        concurrency: 3,
        ..Default::default()
    };

    let groups = vec![
        (
            ExerciseKind::Practice,
            vec![
                active("Zebra", ExerciseKind::Practice),
                active("apple", ExerciseKind::Practice),
                exercise("Bob", ExerciseKind::Practice, ExerciseStatus::Deprecated),
                active("Mango", ExerciseKind::Practice),
            ],
        ),
        (
            ExerciseKind::Concept,
            vec![
                exercise("Lasagna", ExerciseKind::Concept, ExerciseStatus::WorkInProgress),
                exercise("Cars Assemble", ExerciseKind::Concept, ExerciseStatus::Beta),
            ],
        ),
    ];

    let report = pipeline(stager.clone(), runner.clone(), options)
        .run_exercises(groups)
        .await
        .expect("pipeline run");

    assert_eq!(report.kinds.len(), 2);
    assert_eq!(report.kinds[0].kind, ExerciseKind::Concept);
    assert_eq!(names(&report.kinds[0]), vec!["Cars Assemble", "Lasagna"]);
    assert_eq!(report.kinds[1].kind, ExerciseKind::Practice);
    assert_eq!(
        names(&report.kinds[1]),
        vec!["apple", "Bob", "Mango", "Zebra"]
    );
    assert_eq!(report.exercises().count(), 6);

    let slugs: HashSet<&str> = report.exercises().map(|e| e.slug.as_str()).collect();
    assert_eq!(slugs.len(), 6, "no duplicates");

    // Beta exercises run; wip and deprecated are skipped.
    assert_eq!(stager.calls(), 4);
    assert_eq!(runner.runs().len(), 4);
}

/// Later-sorted exercises finishing first do not change report order.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_independent_of_completion() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(
        ScriptedRunner::default()
            .with("apple", Script::Slow(150))
            .with("zebra", Script::Slow(1)),
    );
    let options = RunOptions {
        concurrency: 2,
        ..Default::default()
    };

    let report = pipeline(stager, runner, options)
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![
                active("Zebra", ExerciseKind::Practice),
                active("Apple", ExerciseKind::Practice),
            ],
        )])
        .await
        .expect("pipeline run");

    assert_eq!(names(&report.kinds[0]), vec!["Apple", "Zebra"]);
    assert_eq!(
        report.kinds[0].exercises[0].duration(),
        Some(Duration::from_millis(150))
    );
}

/// Skips never reach the stager or the runner.
#[tokio::test]
async fn test_skipped_exercises_never_stage_or_run() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default());

    let report = pipeline(stager.clone(), runner.clone(), RunOptions::default())
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![
                exercise("Bob", ExerciseKind::Practice, ExerciseStatus::Deprecated),
                exercise("Hello", ExerciseKind::Practice, ExerciseStatus::WorkInProgress),
            ],
        )])
        .await
        .expect("pipeline run");

    assert_eq!(stager.calls(), 0);
    assert!(runner.runs().is_empty());

    let outcomes: Vec<&ExerciseOutcome> = report.exercises().map(|e| &e.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            &ExerciseOutcome::Skipped {
                reason: SkipReason::Deprecated
            },
            &ExerciseOutcome::Skipped {
                reason: SkipReason::WorkInProgress
            },
        ]
    );
    assert_eq!(report.kinds[0].exercises[0].summary_row().duration_ms, None);
    let strict = RunOptions {
        fail_on_test_failure: true,
        ..Default::default()
    };
    assert!(RunGate::evaluate(&report, &strict).passed);
}

/// Include flags turn skips into real runs.
#[tokio::test]
async fn test_include_flags_run_skipped_statuses() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default());
    let options = RunOptions {
        include_wip: true,
        include_deprecated: true,
        ..Default::default()
    };

    let report = pipeline(stager.clone(), runner.clone(), options)
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![
                exercise("Bob", ExerciseKind::Practice, ExerciseStatus::Deprecated),
                exercise("Hello", ExerciseKind::Practice, ExerciseStatus::WorkInProgress),
            ],
        )])
        .await
        .expect("pipeline run");

    assert_eq!(stager.calls(), 2);
    assert!(report
        .exercises()
        .all(|e| matches!(e.outcome, ExerciseOutcome::Evaluated { .. })));
}

/// One crashing container leaves its siblings untouched.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_harness_error_is_contained() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default().with("b", Script::Crash));
    let options = RunOptions {
        concurrency: 3,
        ..Default::default()
    };

    let report = pipeline(stager, runner, options)
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![
                active("A", ExerciseKind::Practice),
                active("B", ExerciseKind::Practice),
                active("C", ExerciseKind::Practice),
            ],
        )])
        .await
        .expect("pipeline run");

    let exercises = &report.kinds[0].exercises;
    assert_eq!(exercises.len(), 3);

    for sibling in [&exercises[0], &exercises[2]] {
        let classification = sibling.classification().expect("evaluated");
        assert_eq!(
            classification.category,
            Category::Passed {
                passed: 1,
                total: 1
            }
        );
        assert_eq!(sibling.duration(), Some(Duration::from_millis(25)));
    }

    let crashed = &exercises[1];
    assert!(crashed.is_harness_error());
    assert_eq!(crashed.duration(), Some(Duration::from_millis(40)));
    assert_eq!(crashed.status_label(), "❌ Error");

    let errors: Vec<&str> = report.kinds[0]
        .harness_errors()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(errors, vec!["B"]);

    let verdict = RunGate::evaluate(&report, &RunOptions::default());
    assert!(!verdict.passed);
    assert_eq!(verdict.violations.len(), 1);
    assert!(verdict.violations[0].contains("137"));
}

/// Staging failures are classified, not propagated.
#[tokio::test]
async fn test_stage_failure_is_contained() {
    let stager = Arc::new(CountingStager::new().failing_on("broken"));
    let runner = Arc::new(ScriptedRunner::default());

    let report = pipeline(stager.clone(), runner.clone(), RunOptions::default())
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![
                active("Broken", ExerciseKind::Practice),
                active("Fine", ExerciseKind::Practice),
            ],
        )])
        .await
        .expect("pipeline run");

    assert_eq!(stager.calls(), 2);
    assert_eq!(runner.runs(), vec!["fine".to_string()]);

    let broken = &report.kinds[0].exercises[0];
    assert!(broken.is_harness_error());
    assert_eq!(broken.duration(), None);
    match &broken.classification().unwrap().category {
        Category::HarnessError { message } => assert!(message.contains("missing.py")),
        other => panic!("unexpected category: {other:?}"),
    }
}

/// Test failures are reported, and only fail the gate when asked to.
#[tokio::test]
async fn test_partial_results_and_gate_policy() {
    let stager = Arc::new(CountingStager::new());
    let verdict = HarnessVerdict::Fail {
        tests: vec![
            TestCaseResult {
                name: "leap year".to_string(),
                status: TestStatus::Pass,
                message: None,
            },
            TestCaseResult {
                name: "century".to_string(),
                status: TestStatus::Fail,
                message: Some("expected false".to_string()),
            },
        ],
    };
    let runner = Arc::new(ScriptedRunner::default().with("leap", Script::Verdict(verdict)));

    let report = pipeline(stager, runner, RunOptions::default())
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![active("Leap", ExerciseKind::Practice)],
        )])
        .await
        .expect("pipeline run");

    let leap = &report.kinds[0].exercises[0];
    assert_eq!(leap.status_label(), "⚠️ 1/2");
    let issues = &leap.classification().unwrap().issues;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message.as_deref(), Some("expected false"));

    assert!(RunGate::evaluate(&report, &RunOptions::default()).passed);
    let strict = RunOptions {
        fail_on_test_failure: true,
        ..Default::default()
    };
    assert!(!RunGate::evaluate(&report, &strict).passed);
}

/// The runner is prepared once, before anything executes.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_prepare_runs_once_first() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default());
    let options = RunOptions {
        concurrency: 4,
        ..Default::default()
    };

    pipeline(stager, runner.clone(), options)
        .run_exercises(vec![
            (
                ExerciseKind::Concept,
                vec![
                    active("One", ExerciseKind::Concept),
                    active("Two", ExerciseKind::Concept),
                ],
            ),
            (
                ExerciseKind::Practice,
                vec![active("Three", ExerciseKind::Practice)],
            ),
        ])
        .await
        .expect("pipeline run");

    assert_eq!(runner.prepared.load(Ordering::SeqCst), 1);
    let log = runner.log.lock().unwrap().clone();
    assert_eq!(log[0], "prepare");
    assert_eq!(log.len(), 4);
}

/// A preparation failure aborts the run before any staging.
#[tokio::test]
async fn test_prepare_failure_is_fatal() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner {
        fail_prepare: true,
        ..Default::default()
    });

    let err = pipeline(stager.clone(), runner.clone(), RunOptions::default())
        .run_exercises(vec![(
            ExerciseKind::Practice,
            vec![active("Leap", ExerciseKind::Practice)],
        )])
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Prepare(_)));
    assert_eq!(stager.calls(), 0);
    assert!(runner.runs().is_empty());
}

/// Only requested kinds and selected slugs are reported.
#[tokio::test]
async fn test_kind_and_slug_selection() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default());
    let options = RunOptions {
        kinds: vec![ExerciseKind::Practice],
        exercises: vec!["leap".to_string()],
        ..Default::default()
    };

    let report = pipeline(stager, runner.clone(), options)
        .run_exercises(vec![
            (
                ExerciseKind::Concept,
                vec![active("Lasagna", ExerciseKind::Concept)],
            ),
            (
                ExerciseKind::Practice,
                vec![
                    active("Leap", ExerciseKind::Practice),
                    active("Bob", ExerciseKind::Practice),
                ],
            ),
        ])
        .await
        .expect("pipeline run");

    assert_eq!(report.kinds.len(), 1);
    assert!(report.kind(ExerciseKind::Concept).is_none());
    assert_eq!(names(&report.kinds[0]), vec!["Leap"]);
    assert_eq!(runner.runs(), vec!["leap".to_string()]);
}

/// End to end: catalog on disk, real stager, scripted harness.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_from_catalog_with_real_staging() {
    let track = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let write = |rel: &str, contents: &str| {
        let path = track.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    };

    write(
        "config.json",
        r#"{"exercises": {
            "concept": [],
            "practice": [
                {"uuid": "7a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d", "slug": "leap", "name": "Leap"},
                {"uuid": "8b2c3d4e-5f6a-4b7c-9d8e-0f1a2b3c4d5e", "slug": "bob", "name": "Bob"}
            ]
        }}"#,
    );
    for slug in ["leap", "bob"] {
        write(
            &format!("exercises/practice/{slug}/.meta/config.json"),
            &format!(
                r#"{{"files": {{"solution": ["{slug}.py"], "test": ["{slug}_test.py"], "example": [".meta/example.py"]}}}}"#
            ),
        );
        write(&format!("exercises/practice/{slug}/{slug}.py"), "stub");
        write(&format!("exercises/practice/{slug}/{slug}_test.py"), "tests");
        write(
            &format!("exercises/practice/{slug}/.meta/example.py"),
            &format!("solution for {slug}"),
        );
    }

    /// Runner checking the staged workspace like a real harness would.
    struct InspectingRunner;

    #[async_trait]
    impl HarnessRunner for InspectingRunner {
        async fn prepare(&self) -> Result<(), RunnerError> {
            Ok(())
        }

        async fn run(&self, slug: &str, workspace: &Path) -> Result<HarnessRun, RunnerError> {
            let solution = fs::read_to_string(workspace.join(format!("{slug}.py"))).unwrap();
            let status = if solution == format!("solution for {slug}")
                && workspace.join(".meta/config.json").exists()
                && workspace.join(format!("{slug}_test.py")).exists()
            {
                TestStatus::Pass
            } else {
                TestStatus::Fail
            };
            Ok(HarnessRun {
                verdict: HarnessVerdict::Pass {
                    tests: vec![TestCaseResult {
                        name: "staged correctly".to_string(),
                        status,
                        message: None,
                    }],
                },
                duration: Duration::from_millis(3),
            })
        }
    }

    let catalog = Catalog::open(track.path()).expect("catalog");
    let report = RefPipeline::new(
        Arc::new(FsStager::new(scratch.path())),
        Arc::new(InspectingRunner),
        RunOptions {
            concurrency: 2,
            ..Default::default()
        },
    )
    .run(&catalog)
    .await
    .expect("pipeline run");

    let practice = report.kind(ExerciseKind::Practice).expect("practice");
    assert_eq!(names(practice), vec!["Bob", "Leap"]);
    assert!(practice
        .exercises
        .iter()
        .all(|e| e.status_label() == "✅ 1/1"));
    assert!(report.kind(ExerciseKind::Concept).unwrap().exercises.is_empty());

    // Workspaces are removed once each exercise is done.
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

/// Catalog errors surface as fatal pipeline errors.
#[tokio::test]
async fn test_catalog_error_is_fatal() {
    let track = tempfile::tempdir().unwrap();
    fs::write(
        track.path().join("config.json"),
        r#"{"exercises": {"practice": [{"uuid": "7a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d", "slug": "ghost", "name": "Ghost"}]}}"#,
    )
    .unwrap();
    let catalog = Catalog::open(track.path()).expect("catalog");

    let runner = Arc::new(ScriptedRunner::default());
    let err = pipeline(Arc::new(CountingStager::new()), runner.clone(), RunOptions::default())
        .run(&catalog)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Catalog(_)));
    assert_eq!(runner.prepared.load(Ordering::SeqCst), 0);
}

/// Concurrent exercises get distinct workspaces.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_workspaces_are_distinct() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(ScriptedRunner::default());
    let options = RunOptions {
        concurrency: 4,
        ..Default::default()
    };
    let exercises: Vec<Exercise> = ["A", "B", "C", "D", "E", "F"]
        .iter()
        .map(|n| active(n, ExerciseKind::Practice))
        .collect();

    pipeline(stager, runner.clone(), options)
        .run_exercises(vec![(ExerciseKind::Practice, exercises)])
        .await
        .expect("pipeline run");

    let workspaces = runner.workspaces.lock().unwrap().clone();
    assert_eq!(workspaces.len(), 6);
    let unique: HashSet<&PathBuf> = workspaces.iter().collect();
    assert_eq!(unique.len(), 6);
}

/// No more than `concurrency` exercises execute at once, and skipped
/// exercises never hold a slot.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_limit_is_enforced() {
    let stager = Arc::new(CountingStager::new());
    let mut runner = ScriptedRunner::default();
    let mut exercises = Vec::new();
    for name in ["A", "B", "C", "D", "E", "F"] {
        runner = runner.with(&name.to_lowercase(), Script::Slow(50));
        exercises.push(active(name, ExerciseKind::Practice));
    }
    // Sorted ahead of every runnable exercise.
    for name in ["0 Draft", "1 Draft", "2 Old"] {
        let status = if name.ends_with("Old") {
            ExerciseStatus::Deprecated
        } else {
            ExerciseStatus::WorkInProgress
        };
        exercises.push(exercise(name, ExerciseKind::Practice, status));
    }
    let runner = Arc::new(runner);
    let options = RunOptions {
        concurrency: 2,
        ..Default::default()
    };

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        pipeline(stager.clone(), runner.clone(), options)
            .run_exercises(vec![(ExerciseKind::Practice, exercises)]),
    )
    .await
    .expect("pipeline finished")
    .expect("pipeline run");

    assert_eq!(runner.peak_in_flight.load(Ordering::SeqCst), 2);
    assert_eq!(runner.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(runner.runs().len(), 6);
    assert_eq!(stager.calls(), 6);
    let skipped = report.kinds[0]
        .exercises
        .iter()
        .filter(|e| matches!(e.outcome, ExerciseOutcome::Skipped { .. }))
        .count();
    assert_eq!(skipped, 3);
}

/// A limit of one runs exercises strictly one after another.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_of_one_is_sequential() {
    let stager = Arc::new(CountingStager::new());
    let runner = Arc::new(
        ScriptedRunner::default()
            .with("a", Script::Slow(30))
            .with("b", Script::Slow(30))
            .with("c", Script::Slow(30)),
    );
    let exercises: Vec<Exercise> = ["A", "B", "C"]
        .iter()
        .map(|n| active(n, ExerciseKind::Practice))
        .collect();

    pipeline(stager, runner.clone(), RunOptions::default())
        .run_exercises(vec![(ExerciseKind::Practice, exercises)])
        .await
        .expect("pipeline run");

    assert_eq!(runner.peak_in_flight.load(Ordering::SeqCst), 1);
}
