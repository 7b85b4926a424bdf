//! Test execution engine
//!
//! Scheduling over the suite tree, and per-test isolation in child processes.

mod filter;
mod isolation;
mod pool;
mod runner;
mod watchdog;

pub use filter::Filter;
pub use isolation::{panic_message, run_direct, CaseExecutor, IsolationRunner};
pub use pool::WorkerPool;
pub use runner::{RunTally, Runner};
pub use watchdog::Watchdog;
