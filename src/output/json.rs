//! JSON lines reporter
//!
//! Emits one JSON object per event on stdout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

use crate::models::{Failure, Suite, TestResult, TestStatus};

use super::reporter::{Reporter, ReporterLock};

/// A single reported event
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JsonEvent<'a> {
    SuiteStarted {
        name: &'a str,
    },
    SuiteFinished {
        name: &'a str,
    },
    TestFinished {
        path: &'a str,
        name: &'a str,
        status: TestStatus,
        description: &'a str,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    Summary {
        total: usize,
        passed: usize,
        failures: &'a [Failure],
    },
}

impl<'a> JsonEvent<'a> {
    pub fn test_finished(result: &'a TestResult) -> Self {
        JsonEvent::TestFinished {
            path: &result.path,
            name: &result.name,
            status: result.status,
            description: &result.description,
            duration_ms: result.duration_ms(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// JSON lines reporter
pub struct JsonReporter {
    lock: Mutex<()>,
}

impl JsonReporter {
    pub const NAME: &'static str = "json";

    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn suite_started(&self, suite: &Suite) {
        println!("{}", JsonEvent::SuiteStarted { name: suite.name() }.to_line());
    }

    fn suite_finished(&self, suite: &Suite) {
        println!("{}", JsonEvent::SuiteFinished { name: suite.name() }.to_line());
    }

    fn test_finished(&self, result: &TestResult) {
        println!("{}", JsonEvent::test_finished(result).to_line());
    }

    fn summary(&self, failures: &[Failure], passed: usize, total: usize) {
        let event = JsonEvent::Summary {
            total,
            passed,
            failures,
        };
        println!("{}", event.to_line());
    }

    fn lock(&self) -> ReporterLock<'_> {
        ReporterLock::acquire(&self.lock)
    }
}
