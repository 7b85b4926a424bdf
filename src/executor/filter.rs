//! Qualified-path filter
//!
//! Selects which suites are entered and which cases are scheduled.

use crate::error::RunnerError;
use crate::models::PATH_SEPARATOR;

/// Optional qualified path restricting a run to one case or one subtree
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    path: Option<String>,
}

impl Filter {
    /// A filter that admits everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from a raw path. An empty string admits everything;
    /// a trailing separator is ignored.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_end_matches(PATH_SEPARATOR);
        if trimmed.is_empty() {
            Self::all()
        } else {
            Self {
                path: Some(trimmed.to_string()),
            }
        }
    }

    /// Build a filter from user input, rejecting paths that do not name at
    /// least `suite/...`.
    pub fn parse(raw: &str) -> Result<Self, RunnerError> {
        if !raw.is_empty() && !raw.contains(PATH_SEPARATOR) {
            return Err(RunnerError::InvalidFilter(raw.to_string()));
        }
        Ok(Self::new(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none()
    }

    pub fn as_str(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    /// True when `path` is exactly the filtered path.
    pub fn is_exact(&self, path: &str) -> bool {
        self.path.as_deref() == Some(path)
    }

    /// Whether a suite at `path` should be entered: it is on the way to the
    /// filtered path, is the filtered path, or lies inside it.
    pub fn admits_suite(&self, path: &str) -> bool {
        match &self.path {
            None => true,
            Some(filter) => is_within(filter, path) || is_within(path, filter),
        }
    }

    /// Whether a case at `path` should be scheduled.
    pub fn admits_test(&self, path: &str) -> bool {
        match &self.path {
            None => true,
            Some(filter) => is_within(path, filter),
        }
    }
}

/// `path` equals `root` or is a descendant of it, comparing whole names.
fn is_within(path: &str, root: &str) -> bool {
    match path.strip_prefix(root) {
        Some("") => true,
        Some(rest) => rest.starts_with(PATH_SEPARATOR),
        None => false,
    }
}
