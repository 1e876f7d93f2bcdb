//! Harness verdict classification.
//!
//! Classification is total: every verdict shape maps to exactly one
//! [`Category`], and pipeline failures are expressed as the same
//! harness-error category.

use refcheck_core::{HarnessVerdict, TestCaseResult, TestStatus};
use serde::{Deserialize, Serialize};

/// Reportable outcome category of an executed exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Category {
    /// Every test passed.
    Passed { passed: usize, total: usize },
    /// Some, but not all, tests passed.
    PartiallyPassed { passed: usize, total: usize },
    /// Tests ran and none passed.
    NonePassed { total: usize },
    /// The harness (or the pipeline around it) could not produce test results.
    HarnessError { message: String },
}

impl Category {
    fn from_counts(passed: usize, total: usize) -> Self {
        if passed == total {
            Category::Passed { passed, total }
        } else if passed == 0 {
            Category::NonePassed { total }
        } else {
            Category::PartiallyPassed { passed, total }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Category::Passed { .. })
    }

    pub fn is_harness_error(&self) -> bool {
        matches!(self, Category::HarnessError { .. })
    }

    /// Short status label for summary tables.
    pub fn label(&self) -> String {
        match self {
            Category::Passed { passed, total } => format!("✅ {passed}/{total}"),
            Category::PartiallyPassed { passed, total } => format!("⚠️ {passed}/{total}"),
            Category::NonePassed { total } => format!("❌ 0/{total}"),
            Category::HarnessError { .. } => "❌ Error".to_string(),
        }
    }
}

/// A test that did not pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestIssue {
    pub name: String,
    /// Either `Fail` or `Error`.
    pub status: TestStatus,
    pub message: Option<String>,
}

/// Classified verdict of one exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,

    /// Per-test results in harness order; empty for harness errors.
    pub tests: Vec<TestCaseResult>,

    /// Non-passing tests, in harness order.
    pub issues: Vec<TestIssue>,
}

impl Classification {
    /// Classification for an exercise whose harness never produced results.
    pub fn harness_error(message: impl Into<String>) -> Self {
        Self {
            category: Category::HarnessError {
                message: message.into(),
            },
            tests: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Failed tests (status `fail`).
    pub fn failures(&self) -> impl Iterator<Item = &TestIssue> {
        self.issues.iter().filter(|i| i.status == TestStatus::Fail)
    }

    /// Errored tests (status `error`).
    pub fn errors(&self) -> impl Iterator<Item = &TestIssue> {
        self.issues.iter().filter(|i| i.status == TestStatus::Error)
    }
}

/// Classify a harness verdict.
pub fn classify(verdict: &HarnessVerdict) -> Classification {
    match verdict {
        HarnessVerdict::Error { message } => Classification::harness_error(message.clone()),
        HarnessVerdict::Pass { tests } | HarnessVerdict::Fail { tests } => {
            let passed = tests
                .iter()
                .filter(|t| t.status == TestStatus::Pass)
                .count();
            let issues = tests
                .iter()
                .filter(|t| t.status != TestStatus::Pass)
                .map(|t| TestIssue {
                    name: t.name.clone(),
                    status: t.status,
                    message: t.message.clone(),
                })
                .collect();

            Classification {
                category: Category::from_counts(passed, tests.len()),
                tests: tests.clone(),
                issues,
            }
        }
    }
}
