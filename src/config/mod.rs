//! Configuration module
//!
//! Settings come from, in increasing precedence: defaults, a JSON or YAML
//! config file, `ISOTEST_*` environment variables, and command-line flags.

mod env;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::error::RunnerError;
use crate::executor::Filter;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Worker threads per suite
    pub threads: usize,

    /// Per-test timeout in seconds
    pub timeout_secs: u64,

    /// Reporter names
    pub reporters: Vec<String>,

    /// Only show failures and the summary
    pub errors_only: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            timeout_secs: 60,
            reporters: vec!["console".to_string()],
            errors_only: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Merge the config file (if any), environment and command line.
    pub fn resolve(args: &Args, env: &EnvConfig) -> Result<Self> {
        let file = args
            .config
            .clone()
            .or_else(|| env.config_file.as_ref().map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Self::default(),
        };

        config.threads = env.threads_or(config.threads);
        config.timeout_secs = env.timeout_or(config.timeout_secs);
        if let Some(reporters) = &env.reporters {
            config.reporters = reporters.clone();
        }

        if let Some(threads) = args.tasks {
            config.threads = threads;
        }
        if let Some(timeout) = args.timeout {
            config.timeout_secs = timeout;
        }
        if !args.reporters.is_empty() {
            config.reporters = args.reporters.clone();
        } else if args.quiet {
            config.reporters.clear();
        }
        config.errors_only |= args.error;
        config.threads = config.threads.max(1);

        if config.timeout_secs == 0 {
            return Err(RunnerError::Config("timeout must be at least 1 second".to_string()).into());
        }

        Ok(config)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

/// Settings the scheduler and isolation runner need
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Worker threads per suite, at least 1
    pub threads: usize,

    /// Per-test timeout for isolated executions
    pub timeout: Duration,

    /// Which cases to run
    pub filter: Filter,

    /// Program re-invoked for isolated executions
    pub executable: PathBuf,
}

impl RunnerConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            threads: 1,
            timeout: Duration::from_secs(60),
            filter: Filter::all(),
            executable: executable.into(),
        }
    }

    /// Runner settings for `app` that re-invoke the running program
    pub fn current_exe(app: &AppConfig) -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        Ok(Self::from_app(app, exe))
    }

    /// Runner settings for a resolved application config
    pub fn from_app(app: &AppConfig, executable: impl Into<PathBuf>) -> Self {
        Self::new(executable)
            .with_threads(app.threads)
            .with_timeout(Duration::from_secs(app.timeout_secs))
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("isotest").chain(argv.iter().copied()))
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.reporters, vec!["console"]);
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "threads: 4\ntimeout_secs: 5\nreporters: [json]").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.reporters, vec!["json"]);
        assert!(!config.errors_only);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("isotest.json");
        let config = AppConfig {
            threads: 3,
            errors_only: true,
            ..Default::default()
        };

        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(AppConfig::load("/nonexistent/isotest.json").is_err());
    }

    #[test]
    fn test_resolve_precedence() {
        let env = EnvConfig {
            threads: Some(2),
            timeout: Some(10),
            reporters: Some(vec!["json".to_string()]),
            ..Default::default()
        };

        let config = AppConfig::resolve(&args(&[]), &env).unwrap();
        assert_eq!(config.threads, 2);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.reporters, vec!["json"]);

        let config = AppConfig::resolve(&args(&["-j", "8", "-l", "1", "-r", "console"]), &env)
            .unwrap();
        assert_eq!(config.threads, 8);
        assert_eq!(config.timeout_secs, 1);
        assert_eq!(config.reporters, vec!["console"]);
    }

    #[test]
    fn test_resolve_quiet_and_zero_threads() {
        let config = AppConfig::resolve(&args(&["-q", "-j", "0"]), &EnvConfig::default()).unwrap();
        assert!(config.reporters.is_empty());
        assert_eq!(config.threads, 1);

        let config =
            AppConfig::resolve(&args(&["-q", "-r", "json"]), &EnvConfig::default()).unwrap();
        assert_eq!(config.reporters, vec!["json"]);
    }

    #[test]
    fn test_resolve_rejects_zero_timeout() {
        let err = AppConfig::resolve(&args(&["-l", "0"]), &EnvConfig::default()).unwrap_err();
        assert!(err.to_string().contains("timeout must be at least 1 second"));
    }

    #[test]
    fn test_resolve_reads_config_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"threads": 6, "errors_only": true}}"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = AppConfig::resolve(&args(&["-c", &path]), &EnvConfig::default()).unwrap();
        assert_eq!(config.threads, 6);
        assert!(config.errors_only);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_runner_config_from_app() {
        let app = AppConfig {
            threads: 0,
            timeout_secs: 3,
            ..Default::default()
        };
        let runner = RunnerConfig::from_app(&app, "/bin/isotest");
        assert_eq!(runner.executable, PathBuf::from("/bin/isotest"));
        assert_eq!(runner.threads, 1);
        assert_eq!(runner.timeout, Duration::from_secs(3));
        assert!(runner.filter.is_empty());
    }
}
