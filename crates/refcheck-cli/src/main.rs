//! refcheck - test a track's reference solutions
//!
//! Stages every exercise's reference solution in place of its stub, runs
//! the track's test runner image against it and reports the results.
//!
//! ## Commands
//!
//! - `run`: Test the reference solutions of the selected exercises
//! - `plan`: Show where each file of an exercise would be staged

mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use refcheck_ci::{
    plan_copies, ContainerRunner, FsStager, HarnessConfig, RefPipeline, RunGate, RunOptions,
};
use refcheck_core::{init_tracing, Catalog, ExerciseKind};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "refcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Test a track's exercise reference solutions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test reference solutions with the track's test runner
    Run(RunArgs),

    /// Show the staging plan of one exercise without copying anything
    Plan {
        /// Exercise slug
        slug: String,

        /// Track root directory (contains config.json)
        #[arg(long, default_value = ".")]
        track_root: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Test runner image
    #[arg(long, env = "TEST_RUNNER_IMAGE")]
    image: String,

    /// Track root directory (contains config.json)
    #[arg(long, default_value = ".")]
    track_root: PathBuf,

    /// Exercise kind to test (repeatable, default: all)
    #[arg(long = "kind", value_enum)]
    kinds: Vec<KindArg>,

    /// Only test this exercise slug (repeatable)
    #[arg(long = "exercise")]
    exercises: Vec<String>,

    /// Also test work-in-progress exercises
    #[arg(long)]
    include_wip: bool,

    /// Also test deprecated exercises
    #[arg(long)]
    include_deprecated: bool,

    /// Fail when a reference solution fails its tests
    #[arg(long)]
    fail_on_test_failure: bool,

    /// Number of exercises tested at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Container engine executable
    #[arg(long, default_value = "docker")]
    engine: String,

    /// Do not pull the image before testing
    #[arg(long)]
    no_pull: bool,

    /// Per-exercise timeout in seconds (0 = none)
    #[arg(long, default_value_t = 0)]
    timeout_secs: u64,

    /// Directory in which workspaces are created (default: system temp dir)
    #[arg(long)]
    workspace_root: Option<PathBuf>,

    /// Append a Markdown summary to this file
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    summary: Option<PathBuf>,

    /// Write the full run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Concept,
    Practice,
}

impl From<KindArg> for ExerciseKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Concept => ExerciseKind::Concept,
            KindArg::Practice => ExerciseKind::Practice,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Plan { slug, track_root } => cmd_plan(&track_root, &slug),
    }
}

fn run_options(args: &RunArgs) -> RunOptions {
    let kinds = if args.kinds.is_empty() {
        ExerciseKind::ALL.to_vec()
    } else {
        args.kinds.iter().copied().map(ExerciseKind::from).collect()
    };

    RunOptions {
        kinds,
        include_wip: args.include_wip,
        include_deprecated: args.include_deprecated,
        fail_on_test_failure: args.fail_on_test_failure,
        concurrency: usize::from(args.concurrency),
        exercises: args.exercises.clone(),
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let catalog = Catalog::open(&args.track_root)
        .with_context(|| format!("Failed to read track at {:?}", args.track_root))?;

    // Bind mounts need absolute paths.
    let workspace_root = match &args.workspace_root {
        Some(root) => std::fs::canonicalize(root)
            .with_context(|| format!("Workspace root not found: {:?}", root))?,
        None => std::env::temp_dir(),
    };

    let mut config = HarnessConfig::new(args.image.clone());
    config.engine = args.engine.clone();
    config.pull = !args.no_pull;
    config.timeout_secs = args.timeout_secs;

    let options = run_options(&args);
    info!(
        image = %config.image,
        engine = %config.engine,
        concurrency = options.concurrency,
        "Testing reference solutions"
    );

    let pipeline = RefPipeline::new(
        Arc::new(FsStager::new(workspace_root)),
        Arc::new(ContainerRunner::new(config)),
        options,
    );
    let run = pipeline.run(&catalog).await.context("Test run aborted")?;

    for exercise in run.exercises() {
        report::print_exercise(exercise);
    }

    let markdown = report::render_markdown(&run);
    println!();
    println!("{}", markdown);

    if let Some(path) = &args.summary {
        report::append_summary(path, &markdown)?;
    }
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&run)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
    }

    let verdict = RunGate::evaluate(&run, pipeline.options());
    println!(
        "Gate: {} ({})",
        if verdict.passed { "✓ PASSED" } else { "✗ FAILED" },
        verdict.message
    );
    println!("Duration: {:.3}s", run.duration.as_secs_f64());

    if !verdict.violations.is_empty() {
        println!("Violations:");
        for violation in &verdict.violations {
            println!("  - {}", violation);
        }
    }

    if verdict.passed {
        println!("\n✓ All reference solutions passed!");
        Ok(())
    } else {
        anyhow::bail!("Reference solution checks failed")
    }
}

fn cmd_plan(track_root: &Path, slug: &str) -> Result<()> {
    let catalog = Catalog::open(track_root)
        .with_context(|| format!("Failed to read track at {:?}", track_root))?;

    for kind in ExerciseKind::ALL {
        if !catalog.descriptors(kind).iter().any(|d| d.slug == slug) {
            continue;
        }
        let exercise = catalog
            .for_kind(kind)?
            .into_iter()
            .find(|e| e.slug() == slug)
            .with_context(|| format!("Exercise not found: {}", slug))?;

        println!("{} ({} exercise)", exercise.name(), kind);
        for op in plan_copies(&exercise)? {
            println!(
                "  {:<14} {} -> {}",
                format!("{:?}", op.role),
                op.from.display(),
                op.to.display()
            );
        }
        return Ok(());
    }

    anyhow::bail!("Exercise not found: {}", slug)
}
