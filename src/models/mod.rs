//! Data models for test execution
//!
//! The test tree and the results it produces.

mod suite;
mod test_result;

pub use suite::{
    join_path, validate_tree, Suite, TestAction, TestCase, TestOutcome, PATH_SEPARATOR,
};
pub use test_result::{Failure, RunSummary, TestResult, TestStatus};
