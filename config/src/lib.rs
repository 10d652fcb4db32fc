//! Wait configuration for Tarry.
//!
//! Resolution order, later wins: built-in defaults, a TOML document, then
//! environment variables. Raw TOML structs (with `Option` fields) stay private;
//! callers only ever see a validated [`WaitConfig`].

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default bound on a single wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WORKER_THREADS: usize = 1;

/// Overrides the default timeout, in (possibly fractional) seconds.
pub const TIMEOUT_ENV: &str = "TARRY_WAIT_TIMEOUT_SECS";
/// Overrides [`EmptyCompletionPolicy`]: `report` or `allow`.
pub const EMPTY_COMPLETION_ENV: &str = "TARRY_EMPTY_COMPLETION";

/// What a value wait does when the producer finishes without emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCompletionPolicy {
    /// Report a failure; callers waiting for a value almost always expect one.
    #[default]
    Report,
    /// Return `CompletedNoValue` silently.
    Allow,
}

impl EmptyCompletionPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EmptyCompletionPolicy::Report => "report",
            EmptyCompletionPolicy::Allow => "allow",
        }
    }
}

impl fmt::Display for EmptyCompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid empty completion policy '{0}'; expected one of: report, allow")]
pub struct PolicyParseError(String);

impl FromStr for EmptyCompletionPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(EmptyCompletionPolicy::Report),
            "allow" => Ok(EmptyCompletionPolicy::Allow),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read wait config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse wait config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("timeout_secs must be a positive, finite number of seconds (got {0})")]
    InvalidTimeout(f64),
    #[error("worker_threads must be at least 1")]
    InvalidWorkerThreads,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWaitConfig {
    timeout_secs: Option<f64>,
    empty_completion: Option<EmptyCompletionPolicy>,
    worker_threads: Option<usize>,
}

/// Validated wait configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    default_timeout: Duration,
    empty_completion: EmptyCompletionPolicy,
    worker_threads: usize,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            empty_completion: EmptyCompletionPolicy::default(),
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

fn timeout_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(secs))
}

impl WaitConfig {
    /// Process-wide configuration: defaults overlaid with the environment.
    pub fn global() -> &'static WaitConfig {
        static CONFIG: OnceLock<WaitConfig> = OnceLock::new();
        CONFIG.get_or_init(|| WaitConfig::default().with_env())
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawWaitConfig = toml::from_str(content)?;
        Self::default().merge(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(source) => {
                tracing::warn!("Failed to read wait config at {}: {source}", path.display());
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::from_toml_str(&content).inspect_err(|err| {
            tracing::warn!("Failed to parse wait config at {}: {err}", path.display());
        })
    }

    fn merge(mut self, raw: RawWaitConfig) -> Result<Self, ConfigError> {
        if let Some(secs) = raw.timeout_secs {
            self.default_timeout = timeout_from_secs(secs)?;
        }
        if let Some(policy) = raw.empty_completion {
            self.empty_completion = policy;
        }
        if let Some(threads) = raw.worker_threads {
            if threads == 0 {
                return Err(ConfigError::InvalidWorkerThreads);
            }
            self.worker_threads = threads;
        }
        Ok(self)
    }

    /// Overlay [`TIMEOUT_ENV`] and [`EMPTY_COMPLETION_ENV`].
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Overlay overrides from an environment-like lookup.
    ///
    /// Unparseable values are ignored with a warning so a typo in the
    /// environment never turns into a test failure of its own.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidTimeout(f64::NAN))
                .and_then(timeout_from_secs)
            {
                Ok(timeout) => self.default_timeout = timeout,
                Err(err) => tracing::warn!(var = TIMEOUT_ENV, value = %raw, "Ignoring override: {err}"),
            }
        }
        if let Some(raw) = lookup(EMPTY_COMPLETION_ENV) {
            match raw.parse::<EmptyCompletionPolicy>() {
                Ok(policy) => self.empty_completion = policy,
                Err(err) => {
                    tracing::warn!(var = EMPTY_COMPLETION_ENV, "Ignoring override: {err}");
                }
            }
        }
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_empty_completion(mut self, policy: EmptyCompletionPolicy) -> Self {
        self.empty_completion = policy;
        self
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    #[must_use]
    pub const fn empty_completion(&self) -> EmptyCompletionPolicy {
        self.empty_completion
    }

    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }
}
