//! Run gate: decides whether a run passed.

use serde::{Deserialize, Serialize};

use crate::classify::Category;
use crate::pipeline::{ExerciseOutcome, RunOptions, RunReport};

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Violations that caused failure (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Run gate evaluation rules.
pub struct RunGate;

impl RunGate {
    /// Evaluate a run report.
    ///
    /// Gate rule:
    /// - Any exercise of a reported kind that ended in a harness error fails the gate
    /// - With `options.fail_on_test_failure`, an executed exercise with a
    ///   non-passing test fails the gate too
    /// - Skipped exercises never affect the gate
    pub fn evaluate(report: &RunReport, options: &RunOptions) -> GateVerdict {
        let fail_on_test_failure = options.fail_on_test_failure;
        let mut violations = Vec::new();

        for kind in &report.kinds {
            for exercise in &kind.exercises {
                let ExerciseOutcome::Evaluated { classification, .. } = &exercise.outcome else {
                    continue;
                };
                match &classification.category {
                    Category::HarnessError { message } => violations.push(format!(
                        "[{}] {}: harness error: {}",
                        kind.kind, exercise.name, message
                    )),
                    Category::PartiallyPassed { passed, total } if fail_on_test_failure => {
                        violations.push(format!(
                            "[{}] {}: {}/{} tests passed",
                            kind.kind, exercise.name, passed, total
                        ))
                    }
                    Category::NonePassed { total } if fail_on_test_failure => {
                        violations.push(format!(
                            "[{}] {}: 0/{} tests passed",
                            kind.kind, exercise.name, total
                        ))
                    }
                    _ => {}
                }
            }
        }

        let passed = violations.is_empty();
        let message = if passed {
            "All exercises passed the gate".to_string()
        } else {
            format!("Gate failed with {} violation(s)", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}
