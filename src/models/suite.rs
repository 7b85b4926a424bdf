//! Test tree models
//!
//! Suites own child suites and test cases. A tree is built once by the user
//! program and stays immutable for the duration of a run.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::RunnerError;

/// Outcome of a test action. An `Err` is a recognized failure; its rendered
/// chain becomes the failure description.
pub type TestOutcome = anyhow::Result<()>;

/// Executable body of a test case
pub type TestAction = Arc<dyn Fn() -> TestOutcome + Send + Sync>;

/// Separator between names in a qualified path
pub const PATH_SEPARATOR: char = '/';

/// Join a parent path and a child name into a qualified path.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{name}")
    }
}

/// A named, executable test case
#[derive(Clone)]
pub struct TestCase {
    name: String,
    action: TestAction,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> TestOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Arc::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the action on the current thread.
    pub fn run(&self) -> TestOutcome {
        (self.action)()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// A named group of child suites and test cases
#[derive(Clone, Debug)]
pub struct Suite {
    name: String,
    suites: Vec<Suite>,
    tests: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suites: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// Add a test case built from a closure
    pub fn with_test<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> TestOutcome + Send + Sync + 'static,
    {
        self.with_case(TestCase::new(name, action))
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.tests.push(case);
        self
    }

    pub fn with_suite(mut self, suite: Suite) -> Self {
        self.suites.push(suite);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    /// Number of test cases in this subtree
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.suites.iter().map(Suite::test_count).sum::<usize>()
    }

    /// Qualified paths of every case in this subtree, in scheduling order
    /// (child suites first, then direct cases).
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths("", &mut paths);
        paths
    }

    fn collect_paths(&self, parent: &str, out: &mut Vec<String>) {
        let path = join_path(parent, &self.name);
        for suite in &self.suites {
            suite.collect_paths(&path, out);
        }
        for test in &self.tests {
            out.push(join_path(&path, test.name()));
        }
    }
}

/// Check that every qualified path in the tree is unambiguous.
pub fn validate_tree(suites: &[Suite]) -> Result<(), RunnerError> {
    validate_level(suites, &[], "")
}

fn validate_level(suites: &[Suite], tests: &[TestCase], parent: &str) -> Result<(), RunnerError> {
    let mut seen = HashSet::new();

    for name in suites
        .iter()
        .map(Suite::name)
        .chain(tests.iter().map(TestCase::name))
    {
        let path = join_path(parent, name);
        if name.is_empty() || name.contains(PATH_SEPARATOR) {
            return Err(RunnerError::InvalidName(path));
        }
        if !seen.insert(name) {
            return Err(RunnerError::DuplicateName(path));
        }
    }

    for suite in suites {
        validate_level(&suite.suites, &suite.tests, &join_path(parent, &suite.name))?;
    }

    Ok(())
}
