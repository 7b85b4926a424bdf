//! Console reporter
//!
//! Human-readable output on stdout, indented by suite depth.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{Failure, Suite, TestCase, TestResult, TestStatus};

use super::reporter::{Reporter, ReporterLock, ReporterOptions};

const INDENT: &str = "  ";
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Console reporter
pub struct ConsoleReporter {
    formatter: ConsoleFormatter,
    errors_only: bool,
    depth: AtomicUsize,
    /// A `test_started` line is waiting for its status
    line_open: AtomicBool,
    lock: Mutex<()>,
}

impl ConsoleReporter {
    pub const NAME: &'static str = "console";

    pub fn new(options: ReporterOptions) -> Self {
        Self {
            formatter: ConsoleFormatter {
                colorize: options.colorize,
            },
            errors_only: options.errors_only,
            depth: AtomicUsize::new(0),
            line_open: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    fn indent(&self) -> String {
        INDENT.repeat(self.depth.load(Ordering::SeqCst))
    }
}

impl Reporter for ConsoleReporter {
    fn suite_started(&self, suite: &Suite) {
        if !self.errors_only {
            println!("{}{}", self.indent(), self.formatter.suite_header(suite));
        }
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn suite_finished(&self, _suite: &Suite) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    fn test_started(&self, test: &TestCase) {
        if self.errors_only {
            return;
        }
        print!("{}{} ... ", self.indent(), test.name());
        let _ = std::io::stdout().flush();
        self.line_open.store(true, Ordering::SeqCst);
    }

    fn test_finished(&self, result: &TestResult) {
        let open = self.line_open.swap(false, Ordering::SeqCst);
        if self.errors_only && result.status.is_success() {
            return;
        }

        let line = self.formatter.result_status(result);
        if open {
            println!("{line}");
        } else {
            println!("{}{} ... {}", self.indent(), result.name, line);
        }
    }

    fn summary(&self, failures: &[Failure], passed: usize, total: usize) {
        print!("{}", self.formatter.summary(failures, passed, total));
    }

    fn lock(&self) -> ReporterLock<'_> {
        ReporterLock::acquire(&self.lock)
    }
}

/// String rendering for console output
#[derive(Clone, Copy, Debug)]
pub struct ConsoleFormatter {
    pub colorize: bool,
}

impl ConsoleFormatter {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.colorize {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn status_label(&self, status: TestStatus) -> String {
        let label = format!("{} {}", status.symbol(), status.to_string().to_uppercase());
        match status {
            TestStatus::Passed => self.paint(&label, "32"),
            TestStatus::TimedOut => self.paint(&label, "33"),
            _ => self.paint(&label, "31"),
        }
    }

    pub fn suite_header(&self, suite: &Suite) -> String {
        self.paint(suite.name(), "1")
    }

    /// Status part of a result line, with the description on failure
    pub fn result_status(&self, result: &TestResult) -> String {
        let mut line = format!(
            "{} [{}ms]",
            self.status_label(result.status),
            result.duration_ms()
        );
        if !result.description.is_empty() {
            line.push_str(&format!(": {}", result.description));
        }
        line
    }

    pub fn summary(&self, failures: &[Failure], passed: usize, total: usize) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');

        let failed = failures.len();
        let failed_str = if failed > 0 {
            self.paint(&failed.to_string(), "31")
        } else {
            failed.to_string()
        };
        output.push_str(&format!(
            "Total: {} | Passed: {} | Failed: {}\n",
            total,
            self.paint(&passed.to_string(), "32"),
            failed_str
        ));

        if !failures.is_empty() {
            output.push_str("\nFailed tests:\n");
            for failure in failures {
                output.push_str(&format!(
                    "{}{} ({})\n",
                    INDENT,
                    failure.path,
                    self.status_label(failure.status)
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }
}
