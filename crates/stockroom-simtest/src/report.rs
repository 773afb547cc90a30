//! Pass/fail bookkeeping for a harness run.

use serde::Serialize;
use stockroom_logic::controller::RoundSummary;

#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl TestResult {
    pub fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// Everything a run produced, printable as JSON with `--json`.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub rounds: Vec<RoundSummary>,
    pub results: Vec<TestResult>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}
