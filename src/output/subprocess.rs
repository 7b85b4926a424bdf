//! Subprocess reporter
//!
//! Used by child processes: writes the single result line a parent reads
//! from the pipe. Every other event is ignored.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use crate::models::{Suite, TestResult, TestStatus};
use crate::protocol;

use super::capture::StdoutCapture;
use super::reporter::{Reporter, ReporterLock};

pub struct SubprocessReporter {
    lock: Mutex<()>,
    capture_output: bool,
    capture: Mutex<Option<StdoutCapture>>,
}

impl SubprocessReporter {
    pub const NAME: &'static str = "subprocess";

    /// Reporter writing straight to stdout
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            capture_output: false,
            capture: Mutex::new(None),
        }
    }

    /// Reporter that moves test output to stderr once the first suite
    /// starts, keeping stdout for the result line alone.
    pub fn capturing() -> Self {
        Self {
            capture_output: true,
            ..Self::new()
        }
    }

    fn write_result(&self, bytes: &[u8]) -> io::Result<()> {
        let mut capture = self.capture.lock().unwrap_or_else(PoisonError::into_inner);
        match capture.as_mut() {
            Some(capture) => capture.write_flushed(bytes),
            None => write_flushed(bytes),
        }
    }
}

impl Default for SubprocessReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for SubprocessReporter {
    fn suite_started(&self, _suite: &Suite) {
        if !self.capture_output {
            return;
        }
        let mut capture = self.capture.lock().unwrap_or_else(PoisonError::into_inner);
        if capture.is_none() {
            match StdoutCapture::start() {
                Ok(started) => *capture = Some(started),
                Err(e) => warn!("test output will share the result pipe: {}", e),
            }
        }
    }

    fn test_finished(&self, result: &TestResult) {
        let line = protocol::encode(result.status, &result.description);
        if let Err(e) = self.write_result(line.as_bytes()) {
            warn!("failed to report result for {}: {}", result.path, e);
        }
    }

    fn lock(&self) -> ReporterLock<'_> {
        ReporterLock::acquire(&self.lock)
    }
}

/// Write the bare `not_found` code used when a quiet run is handed a
/// malformed test name.
pub fn write_not_found() -> io::Result<()> {
    write_flushed(TestStatus::NotFound.code().to_string().as_bytes())
}

fn write_flushed(bytes: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()
}
