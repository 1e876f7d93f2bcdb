//! Console output and Markdown summary for a finished run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use refcheck_ci::{ExerciseOutcome, ExerciseReport, KindReport, RunReport, SummaryRow};
use refcheck_core::TestStatus;
use tracing::{error, warn};

/// Print per-test results of one exercise.
pub fn print_exercise(exercise: &ExerciseReport) {
    let ExerciseOutcome::Evaluated {
        classification,
        duration,
    } = &exercise.outcome
    else {
        return;
    };

    println!("{}", exercise.name);
    if let refcheck_ci::Category::HarnessError { message } = &classification.category {
        error!("[{}] Error while running tests: {}", exercise.name, message);
        return;
    }

    for test in &classification.tests {
        println!(
            "  [{}] {}",
            test.status.as_str().to_uppercase(),
            test.name
        );
    }
    for issue in &classification.issues {
        let verb = match issue.status {
            TestStatus::Error => "errored",
            _ => "failed",
        };
        warn!(
            "[{}] Test {}: {}: {}",
            exercise.name,
            verb,
            issue.name,
            issue.message.as_deref().unwrap_or("no message")
        );
    }
    if let Some(duration) = duration {
        println!("  Duration: {:.3} ms", duration.as_secs_f64() * 1000.0);
    }
}

fn render_table(rows: &[SummaryRow]) -> String {
    let mut md = String::from("| Exercise | Status | Duration (ms) |\n| --- | --- | --- |\n");
    for row in rows {
        let duration = row
            .duration_ms
            .map(|ms| format!("{ms:.3}"))
            .unwrap_or_default();
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&row.name),
            escape_cell(&row.status),
            duration
        ));
    }
    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Render the summary section of one kind.
pub fn render_kind(kind: &KindReport) -> String {
    format!(
        "## {} exercise test results\n\n{}",
        kind.kind.title(),
        render_table(&kind.summary_rows())
    )
}

/// Render the whole run as Markdown.
pub fn render_markdown(report: &RunReport) -> String {
    report
        .kinds
        .iter()
        .map(render_kind)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append `markdown` to the summary file at `path`, creating it if needed.
pub fn append_summary(path: &Path, markdown: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open summary file {}", path.display()))?;
    file.write_all(markdown.as_bytes())
        .with_context(|| format!("Failed to write summary file {}", path.display()))?;
    Ok(())
}
