//! isotest - Isolated Test Runner
//!
//! Runs a tree of test suites, executing each test case in a child copy of
//! the test program so that crashes, aborts and hangs are contained and
//! reported as results instead of taking down the run.
//!
//! ## Features
//!
//! - Per-test process isolation with a per-test timeout
//! - Bounded worker pool per suite
//! - Filtering by qualified path (`suite(s)/testcase`) or subtree
//! - Console, JSON and subprocess reporters, combinable
//! - Configuration from flags, `ISOTEST_*` environment variables or a file
//!
//! ## Usage
//!
//! ```no_run
//! use isotest::{Suite, TestCase};
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let suites = vec![Suite::new("math")
//!         .with_test("add_ok", || {
//!             anyhow::ensure!(1 + 1 == 2, "addition is broken");
//!             Ok(())
//!         })
//!         .with_case(TestCase::new("div_by_zero", || anyhow::bail!("division by zero")))];
//!
//!     isotest::run(suites).await
//! }
//! ```
//!
//! ```bash
//! # Run everything on 4 workers with a 10 second timeout
//! my-tests -j 4 -l 10
//!
//! # Run one subtree, reporting JSON lines
//! my-tests -t math/ -r json
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod protocol;
pub mod utils;

use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

pub use cli::Args;
pub use config::{AppConfig, EnvConfig, RunnerConfig};
pub use error::RunnerError;
pub use executor::{Filter, Runner};
pub use models::{Failure, RunSummary, Suite, TestCase, TestOutcome, TestResult, TestStatus};
pub use output::{Reporter, ReporterOptions, ReporterRegistry};

use models::validate_tree;
use utils::{init_logger, LogLevel};

/// Run `suites` with the process command line.
pub async fn run(suites: Vec<Suite>) -> ExitCode {
    run_with_args(suites, std::env::args_os()).await
}

/// Run `suites` with an explicit command line, program name first.
pub async fn run_with_args<I, T>(suites: Vec<Suite>, argv: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run_tests(suites, &args, &ReporterRegistry::builtin()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolve configuration, run and report. Exits successfully only when every
/// scheduled test passed.
pub async fn run_tests(
    suites: Vec<Suite>,
    args: &Args,
    registry: &ReporterRegistry,
) -> Result<ExitCode> {
    let env = EnvConfig::load();
    let app = AppConfig::resolve(args, &env)?;
    init_logger(
        LogLevel::from_flags(args.verbose, app.errors_only),
        env.log.as_deref(),
    );

    validate_tree(&suites)?;

    // Unknown reporter names are reported even when the filter is also bad.
    let options = ReporterOptions {
        errors_only: app.errors_only,
        colorize: !env.no_color,
    };
    let reporter: Arc<dyn Reporter> = Arc::new(registry.create(&app.reporters, &options)?);

    let filter = match Filter::parse(args.test.as_deref().unwrap_or_default()) {
        Ok(filter) => filter,
        Err(e) if args.quiet => {
            debug!("{}", e);
            output::write_not_found()?;
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if args.list {
        for path in suites.iter().flat_map(Suite::paths) {
            if filter.admits_test(&path) {
                println!("{path}");
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let runner = Runner::new(RunnerConfig::current_exe(&app)?.with_filter(filter));
    runner.run(&suites, reporter.clone()).await;
    let summary = runner.summary(reporter.as_ref());

    Ok(if summary.is_all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
