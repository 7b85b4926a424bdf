//! Per-test execution
//!
//! A case whose path is exactly the active filter runs directly in this
//! process. Every other case runs in a child copy of the program, started
//! with `--test <path> --reporter subprocess`, which reports back one result
//! line over its stdout pipe.

use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::cli::Args;
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::models::{TestCase, TestResult, TestStatus};
use crate::protocol;
use crate::utils::Timer;

use super::watchdog::Watchdog;

/// Longest result line accepted from a child, newline included
pub const MAX_RESULT_LINE: usize = 64 * 1024;

/// Produces exactly one result for one scheduled case
pub trait CaseExecutor: Send + Sync {
    fn execute(&self, case: TestCase, path: String) -> BoxFuture<'static, TestResult>;
}

/// Runs cases directly or in an isolated child process
#[derive(Clone)]
pub struct IsolationRunner {
    config: Arc<RunnerConfig>,
}

impl IsolationRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute one case, choosing the branch from the active filter.
    pub async fn run(&self, case: TestCase, path: String) -> TestResult {
        if self.config.filter.is_exact(&path) {
            run_direct(case, path).await
        } else {
            self.run_isolated(case, path).await
        }
    }

    /// Run `path` in a child process and translate what comes back.
    pub async fn run_isolated(&self, case: TestCase, path: String) -> TestResult {
        let timer = Timer::start(&path);
        let (status, description) = self.spawn_and_read(&path).await;

        TestResult::new(case.name(), path, status)
            .with_description(description)
            .with_duration(timer.stop())
    }

    async fn spawn_and_read(&self, path: &str) -> (TestStatus, String) {
        let mut command = Command::new(&self.config.executable);
        command
            .args(Args::child_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped());
        #[cfg(unix)]
        command.process_group(0);

        let spawned = command.spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => return (TestStatus::Crashed, RunnerError::Spawn(e).to_string()),
        };

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill().await;
            return (
                TestStatus::Crashed,
                "child stdout was not captured".to_string(),
            );
        };

        debug!("spawned child {:?} for {}", child.id(), path);
        let watchdog = Watchdog::start(self.config.timeout, child, path);

        // Processes the child left behind may hold the pipe open after it is
        // killed, so the read gives up as soon as the deadline passes.
        let mut line = String::new();
        let mut reader = BufReader::new(stdout.take(MAX_RESULT_LINE as u64));
        let read = tokio::select! {
            biased;
            read = reader.read_line(&mut line) => read,
            _ = watchdog.expired() => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "deadline passed before the result line",
            )),
        };
        let fired = watchdog.finish().await;

        resolve(read, &line, fired, &self.config)
    }
}

impl CaseExecutor for IsolationRunner {
    fn execute(&self, case: TestCase, path: String) -> BoxFuture<'static, TestResult> {
        let runner = self.clone();
        async move { runner.run(case, path).await }.boxed()
    }
}

/// Run a case on a blocking thread of this process.
pub async fn run_direct(case: TestCase, path: String) -> TestResult {
    let timer = Timer::start(&path);
    let name = case.name().to_string();

    let outcome = tokio::task::spawn_blocking(move || case.run()).await;
    let (status, description) = match outcome {
        Ok(Ok(())) => (TestStatus::Passed, String::new()),
        Ok(Err(e)) => (TestStatus::Failed, format!("{e:#}")),
        Err(e) if e.is_panic() => (TestStatus::Failed, panic_message(e.into_panic())),
        Err(e) => (TestStatus::Failed, e.to_string()),
    };

    TestResult::new(name, path, status)
        .with_description(description)
        .with_duration(timer.stop())
}

/// Text of a panic payload. `panic!` and `assert!` produce `&str` or `String`.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked with a non-string payload".to_string()
    }
}

/// Map the outcome of the pipe read to a status.
///
/// A well-formed line with an execution code wins even if the deadline passed
/// while it was being read. Anything else is a timeout when the watchdog
/// fired and a crash otherwise.
fn resolve(
    read: io::Result<usize>,
    line: &str,
    fired: bool,
    config: &RunnerConfig,
) -> (TestStatus, String) {
    let failure = match read {
        Ok(0) => "child exited without reporting a result".to_string(),
        Ok(n) if n >= MAX_RESULT_LINE && !line.ends_with('\n') => {
            format!("result line exceeds {MAX_RESULT_LINE} bytes")
        }
        Ok(_) => match protocol::decode(line) {
            Ok((code, description)) => match TestStatus::from_code(code) {
                Some(status) => return (status, description),
                None => format!("child reported unknown status code {code}"),
            },
            Err(e) => e.to_string(),
        },
        Err(e) => format!("failed to read child result: {e}"),
    };

    if fired {
        (
            TestStatus::TimedOut,
            format!("timed out after {}s", config.timeout.as_secs_f64()),
        )
    } else {
        (TestStatus::Crashed, failure)
    }
}
