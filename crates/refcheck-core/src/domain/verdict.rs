//! The verdict a test-runner harness writes to `results.json`.

use serde::{Deserialize, Serialize};

/// Status of a single test inside a verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Error => "error",
        }
    }
}

/// One per-test entry of a `pass`/`fail` verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCaseResult {
    pub name: String,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Decoded `results.json`.
///
/// Tagged on `status`; any other shape fails to decode and is treated by
/// the runner as a harness error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HarnessVerdict {
    /// Every test passed.
    Pass { tests: Vec<TestCaseResult> },
    /// At least one test did not pass.
    Fail { tests: Vec<TestCaseResult> },
    /// The harness could not run the tests at all.
    Error { message: String },
}

impl HarnessVerdict {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// Per-test results; empty for an `error` verdict.
    pub fn tests(&self) -> &[TestCaseResult] {
        match self {
            HarnessVerdict::Pass { tests } | HarnessVerdict::Fail { tests } => tests,
            HarnessVerdict::Error { .. } => &[],
        }
    }
}
