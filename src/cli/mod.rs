//! CLI argument parsing
//!
//! Defines command-line interface using clap. The same flags are used when a
//! run re-invokes itself to execute one isolated test.

use clap::Parser;
use std::path::PathBuf;

/// Flag selecting a single test or subtree
pub const TEST_FLAG: &str = "--test";
/// Flag selecting a reporter
pub const REPORTER_FLAG: &str = "--reporter";

/// Isolated test runner
#[derive(Parser, Debug, Default)]
#[command(name = "isotest")]
#[command(version)]
#[command(about = "Run test suites with each test isolated in its own process")]
#[command(long_about = None)]
pub struct Args {
    /// Number of worker threads per suite
    #[arg(short = 'j', long = "tasks")]
    pub tasks: Option<usize>,

    /// Run one test or subtree, by qualified path (`suite(s)/testcase`)
    #[arg(short = 't', long = "test")]
    pub test: Option<String>,

    /// Reporter to use (repeatable: console, json, subprocess)
    #[arg(short = 'r', long = "reporter", value_delimiter = ',')]
    pub reporters: Vec<String>,

    /// Disable reporters
    #[arg(short, long)]
    pub quiet: bool,

    /// Timeout for each test in seconds
    #[arg(short = 'l', long)]
    pub timeout: Option<u64>,

    /// Only show errors and the summary
    #[arg(short, long)]
    pub error: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// List qualified test paths and exit
    #[arg(long)]
    pub list: bool,

    /// Configuration file (JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Arguments for a child process running exactly `path`
    pub fn child_args(path: &str) -> Vec<String> {
        vec![
            TEST_FLAG.to_string(),
            path.to_string(),
            REPORTER_FLAG.to_string(),
            "subprocess".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from([
            "isotest", "-j", "4", "-l", "5", "-t", "math/add_ok", "-r", "console", "-r", "json",
        ]);
        assert_eq!(args.tasks, Some(4));
        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.test.as_deref(), Some("math/add_ok"));
        assert_eq!(args.reporters, vec!["console", "json"]);
        assert!(!args.quiet);
    }

    #[test]
    fn test_comma_separated_reporters() {
        let args = Args::parse_from(["isotest", "--reporter", "console,json"]);
        assert_eq!(args.reporters, vec!["console", "json"]);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["isotest"]);
        assert_eq!(args.tasks, None);
        assert_eq!(args.test, None);
        assert!(args.reporters.is_empty());
        assert!(!args.error && !args.verbose && !args.list);
    }

    #[test]
    fn test_child_args_round_trip() {
        let argv = std::iter::once("isotest".to_string()).chain(Args::child_args("a/b/c"));
        let args = Args::parse_from(argv);
        assert_eq!(args.test.as_deref(), Some("a/b/c"));
        assert_eq!(args.reporters, vec!["subprocess"]);
    }
}
