//! Reporting module
//!
//! The reporter interface and the built-in reporters.

mod capture;
mod console;
mod json;
mod reporter;
mod subprocess;

pub use console::{ConsoleFormatter, ConsoleReporter};
pub use json::{JsonEvent, JsonReporter};
pub use reporter::{
    CombinedReporter, Reporter, ReporterFactory, ReporterLock, ReporterOptions, ReporterRegistry,
};
pub use subprocess::{write_not_found, SubprocessReporter};
