//! Test result models
//!
//! Defines test status codes, per-case results and the run summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Test execution status
///
/// The discriminants are the wire codes exchanged between a parent run and
/// its child processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed = 0,
    Failed = 1,
    Crashed = 2,
    TimedOut = 3,
    /// Only produced by CLI validation, never by an execution.
    NotFound = 4,
}

impl TestStatus {
    /// Highest code an execution may report.
    pub const MAX_EXECUTION_CODE: u64 = 3;

    pub fn code(self) -> u64 {
        self as u64
    }

    /// Decode an execution status. `NotFound` and anything above it are rejected.
    pub fn from_code(code: u64) -> Option<TestStatus> {
        match code {
            0 => Some(TestStatus::Passed),
            1 => Some(TestStatus::Failed),
            2 => Some(TestStatus::Crashed),
            3 => Some(TestStatus::TimedOut),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Passed => "✓",
            TestStatus::Failed => "✗",
            TestStatus::Crashed => "!",
            TestStatus::TimedOut => "⏱",
            TestStatus::NotFound => "?",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Crashed => write!(f, "crashed"),
            TestStatus::TimedOut => write!(f, "timed out"),
            TestStatus::NotFound => write!(f, "not found"),
        }
    }
}

/// Result of a single test execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub path: String,
    pub status: TestStatus,
    pub description: String,
    pub duration: Duration,
}

impl TestResult {
    pub fn new(name: impl Into<String>, path: impl Into<String>, status: TestStatus) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            status,
            description: String::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.path,
            self.duration_ms()
        )?;
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        Ok(())
    }
}

/// A non-passed case as recorded in the summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub status: TestStatus,
    pub path: String,
}

impl Failure {
    pub fn new(status: TestStatus, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
        }
    }
}

/// Aggregate outcome of a run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total: {} | Passed: {} | Failed: {}",
            self.total,
            self.passed,
            self.failed()
        )?;
        for failure in &self.failures {
            writeln!(
                f,
                "  {} {} ({})",
                failure.status.symbol(),
                failure.path,
                failure.status
            )?;
        }
        Ok(())
    }
}
