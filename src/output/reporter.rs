//! Reporter interface
//!
//! Reporters observe suite and test lifecycle events. They do not serialize
//! themselves: a caller that may race with other workers takes `lock()` and
//! holds the guard across the calls that must not interleave.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::RunnerError;
use crate::models::{Failure, Suite, TestCase, TestResult};

use super::console::ConsoleReporter;
use super::json::JsonReporter;
use super::subprocess::SubprocessReporter;

/// Lifecycle observer for a run
pub trait Reporter: Send + Sync {
    fn suite_started(&self, _suite: &Suite) {}

    fn suite_finished(&self, _suite: &Suite) {}

    fn test_started(&self, _test: &TestCase) {}

    fn test_finished(&self, _result: &TestResult) {}

    fn summary(&self, _failures: &[Failure], _passed: usize, _total: usize) {}

    /// Acquire exclusive access. Released when the guard is dropped.
    fn lock(&self) -> ReporterLock<'_>;
}

/// Guard returned by [`Reporter::lock`]
#[must_use = "the reporter is unlocked as soon as the guard is dropped"]
pub struct ReporterLock<'a> {
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl<'a> ReporterLock<'a> {
    /// Lock a reporter's own mutex. A poisoned mutex is still acquired; the
    /// unit payload cannot be left inconsistent.
    pub fn acquire(mutex: &'a Mutex<()>) -> Self {
        Self {
            _guards: vec![mutex.lock().unwrap_or_else(PoisonError::into_inner)],
        }
    }

    /// Hold several locks at once, in the order given.
    pub fn merge(locks: impl IntoIterator<Item = ReporterLock<'a>>) -> Self {
        Self {
            _guards: locks.into_iter().flat_map(|l| l._guards).collect(),
        }
    }
}

/// Fans every event out to its members in order
#[derive(Default)]
pub struct CombinedReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl CombinedReporter {
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for CombinedReporter {
    fn suite_started(&self, suite: &Suite) {
        for r in &self.reporters {
            r.suite_started(suite);
        }
    }

    fn suite_finished(&self, suite: &Suite) {
        for r in &self.reporters {
            r.suite_finished(suite);
        }
    }

    fn test_started(&self, test: &TestCase) {
        for r in &self.reporters {
            r.test_started(test);
        }
    }

    fn test_finished(&self, result: &TestResult) {
        for r in &self.reporters {
            r.test_finished(result);
        }
    }

    fn summary(&self, failures: &[Failure], passed: usize, total: usize) {
        for r in &self.reporters {
            r.summary(failures, passed, total);
        }
    }

    fn lock(&self) -> ReporterLock<'_> {
        ReporterLock::merge(self.reporters.iter().map(|r| r.lock()))
    }
}

/// Options handed to reporter factories
#[derive(Clone, Copy, Debug, Default)]
pub struct ReporterOptions {
    /// Only failures and the summary are shown
    pub errors_only: bool,
    pub colorize: bool,
}

pub type ReporterFactory = fn(&ReporterOptions) -> Arc<dyn Reporter>;

/// Named reporter constructors
#[derive(Clone)]
pub struct ReporterRegistry {
    factories: BTreeMap<String, ReporterFactory>,
}

impl ReporterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding `console`, `json` and `subprocess`
    pub fn builtin() -> Self {
        Self::new()
            .with(ConsoleReporter::NAME, console_reporter)
            .with(JsonReporter::NAME, json_reporter)
            .with(SubprocessReporter::NAME, subprocess_reporter)
    }

    pub fn with(mut self, name: impl Into<String>, factory: ReporterFactory) -> Self {
        self.register(name, factory);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ReporterFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build one reporter per name and combine them. No names yields a
    /// reporter that ignores every event.
    pub fn create<S: AsRef<str>>(
        &self,
        names: &[S],
        options: &ReporterOptions,
    ) -> Result<CombinedReporter, RunnerError> {
        let reporters = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.factories
                    .get(name)
                    .map(|factory| factory(options))
                    .ok_or_else(|| RunnerError::UnknownReporter {
                        name: name.to_string(),
                        available: self.names().join(", "),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CombinedReporter::new(reporters))
    }
}

fn console_reporter(options: &ReporterOptions) -> Arc<dyn Reporter> {
    Arc::new(ConsoleReporter::new(*options))
}

fn json_reporter(_: &ReporterOptions) -> Arc<dyn Reporter> {
    Arc::new(JsonReporter::new())
}

fn subprocess_reporter(_: &ReporterOptions) -> Arc<dyn Reporter> {
    Arc::new(SubprocessReporter::capturing())
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        lock: Mutex<()>,
        finished: AtomicUsize,
    }

    impl Reporter for Counting {
        fn test_finished(&self, _result: &TestResult) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }

        fn lock(&self) -> ReporterLock<'_> {
            ReporterLock::acquire(&self.lock)
        }
    }

    #[test]
    fn test_combined_fans_out() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let combined = CombinedReporter::new(vec![a.clone() as Arc<dyn Reporter>, b.clone()]);

        let result = TestResult::new("a", "s/a", TestStatus::Passed);
        combined.test_finished(&result);
        combined.test_finished(&result);

        assert_eq!(a.finished.load(Ordering::SeqCst), 2);
        assert_eq!(b.finished.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_combined_lock_holds_every_member() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let combined = CombinedReporter::new(vec![a.clone() as Arc<dyn Reporter>, b.clone()]);

        let guard = combined.lock();
        assert!(a.lock.try_lock().is_err());
        assert!(b.lock.try_lock().is_err());
        drop(guard);
        assert!(a.lock.try_lock().is_ok());
        assert!(b.lock.try_lock().is_ok());
    }

    #[test]
    fn test_registry_builtin_names() {
        let registry = ReporterRegistry::builtin();
        assert_eq!(registry.names(), vec!["console", "json", "subprocess"]);
    }

    #[test]
    fn test_registry_unknown_reporter() {
        let registry = ReporterRegistry::builtin();
        let err = registry
            .create(&["console", "teamcity"], &ReporterOptions::default())
            .err()
            .unwrap();
        match err {
            RunnerError::UnknownReporter { name, available } => {
                assert_eq!(name, "teamcity");
                assert_eq!(available, "console, json, subprocess");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_registry_quiet() {
        let registry = ReporterRegistry::builtin();
        let names: [&str; 0] = [];
        let reporter = registry.create(&names, &ReporterOptions::default()).unwrap();
        assert!(reporter.is_empty());
        let _guard = reporter.lock();
    }
}
