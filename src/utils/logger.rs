//! Logging utilities
//!
//! Diagnostics always go to stderr: in a child process stdout carries the
//! result line and must stay clean.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Level implied by the command-line verbosity flags
    pub fn from_flags(verbose: bool, errors_only: bool) -> Self {
        if errors_only {
            LogLevel::Error
        } else if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        }
    }
}

/// Build the filter for a level. `directive` overrides it: a bare level name
/// such as `info` applies to this crate, anything else is a full filter.
pub fn build_filter(level: LogLevel, directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(d) => match LogLevel::from_str(d.trim()) {
            Some(level) => crate_filter(level),
            None => EnvFilter::try_new(d).unwrap_or_else(|_| crate_filter(level)),
        },
        None => crate_filter(level),
    }
}

fn crate_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(format!(
        "isotest={}",
        level.to_tracing_level().as_str().to_lowercase()
    ))
}

/// Initialize the logger. Does nothing if a global subscriber is already set.
pub fn init_logger(level: LogLevel, directive: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level, directive))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
