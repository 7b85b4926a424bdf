//! Error types
//!
//! Configuration-time failures that abort a run before scheduling. Per-test
//! failures never surface here; they become `TestStatus` values.

use thiserror::Error;

/// Runner errors
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("invalid test name format `{0}`: expected `suite(s)/testcase`")]
    InvalidFilter(String),

    #[error("unknown reporter `{name}` (available: {available})")]
    UnknownReporter { name: String, available: String },

    #[error("invalid name `{0}`: names must be non-empty and must not contain `/`")]
    InvalidName(String),

    #[error("duplicate name in test tree: {0}")]
    DuplicateName(String),

    #[error("failed to spawn test process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("malformed result line: {0:?}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
