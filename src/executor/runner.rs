//! Test scheduler
//!
//! Walks the suite tree depth-first, one suite at a time. The direct cases of
//! a suite run on a worker pool that is drained before the suite is reported
//! finished, so sibling suites never overlap.

use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::RunnerConfig;
use crate::models::{join_path, Failure, RunSummary, Suite, TestCase, TestResult};
use crate::output::Reporter;

use super::isolation::{CaseExecutor, IsolationRunner};
use super::pool::WorkerPool;

/// Aggregate counters shared by the workers of a run
#[derive(Debug, Default)]
pub struct RunTally {
    total: AtomicUsize,
    passed: AtomicUsize,
    failures: Mutex<Vec<Failure>>,
}

impl RunTally {
    fn schedule(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    fn record(&self, result: &TestResult) {
        if result.status.is_success() {
            self.passed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Failure::new(result.status, result.path.clone()));
        }
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn passed(&self) -> usize {
        self.passed.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            total: self.total(),
            passed: self.passed(),
            failures: self
                .failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Test scheduler
pub struct Runner {
    config: RunnerConfig,
    executor: Arc<dyn CaseExecutor>,
    tally: Arc<RunTally>,
}

impl Runner {
    /// A runner that isolates cases in child processes
    pub fn new(config: RunnerConfig) -> Self {
        let executor = Arc::new(IsolationRunner::new(config.clone()));
        Self::with_executor(config, executor)
    }

    pub fn with_executor(config: RunnerConfig, executor: Arc<dyn CaseExecutor>) -> Self {
        Self {
            config,
            executor,
            tally: Arc::new(RunTally::default()),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn total(&self) -> usize {
        self.tally.total()
    }

    pub fn passed(&self) -> usize {
        self.tally.passed()
    }

    /// Run every admitted case. Counts accumulate if called more than once.
    pub async fn run(&self, suites: &[Suite], reporter: Arc<dyn Reporter>) -> RunSummary {
        info!(
            "Running {} suite(s) with {} worker(s), timeout {:?}",
            suites.len(),
            self.config.threads,
            self.config.timeout
        );
        let start = Instant::now();

        for suite in suites {
            self.handle_suite(suite, &reporter, String::new()).await;
        }

        let summary = self.tally.snapshot();
        info!(
            "Run completed in {}ms - Passed: {}/{} ({:.1}%)",
            start.elapsed().as_millis(),
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        summary
    }

    /// Report the aggregate so far.
    pub fn summary(&self, reporter: &dyn Reporter) -> RunSummary {
        let summary = self.tally.snapshot();
        reporter.summary(&summary.failures, summary.passed, summary.total);
        summary
    }

    fn handle_suite<'a>(
        &'a self,
        suite: &'a Suite,
        reporter: &'a Arc<dyn Reporter>,
        parent: String,
    ) -> BoxFuture<'a, ()> {
        async move {
            let path = join_path(&parent, suite.name());
            if !self.config.filter.admits_suite(&path) {
                return;
            }

            reporter.suite_started(suite);

            for child in suite.suites() {
                self.handle_suite(child, reporter, path.clone()).await;
            }

            let mut pool = WorkerPool::new(self.config.threads);
            for case in suite.tests() {
                let case_path = join_path(&path, case.name());
                if !self.config.filter.admits_test(&case_path) {
                    continue;
                }

                self.tally.schedule();
                pool.spawn(run_case(
                    case.clone(),
                    case_path,
                    self.config.threads,
                    self.executor.clone(),
                    reporter.clone(),
                    self.tally.clone(),
                ));
            }

            debug!("{}: {} case(s) scheduled", path, pool.len());
            pool.drain().await;

            reporter.suite_finished(suite);
        }
        .boxed()
    }
}

/// Execute one case and report it. With a single worker `test_started` is
/// live; with several, both events are emitted together under the reporter
/// lock so output from concurrent cases cannot interleave.
async fn run_case(
    case: TestCase,
    path: String,
    threads: usize,
    executor: Arc<dyn CaseExecutor>,
    reporter: Arc<dyn Reporter>,
    tally: Arc<RunTally>,
) {
    if threads == 1 {
        reporter.test_started(&case);
    }

    let result = executor.execute(case.clone(), path).await;

    if threads == 1 {
        reporter.test_finished(&result);
    } else {
        let _guard = reporter.lock();
        reporter.test_started(&case);
        reporter.test_finished(&result);
    }

    tally.record(&result);
}
