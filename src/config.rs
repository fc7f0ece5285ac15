#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::warn;

use crate::{
    constants::DEFAULT_HOOK_MAX_OPERATIONS,
    util::{bundled_checker_jar, java_path},
};

/// Java launcher override.
pub const JAVA_ENV: &str = "JFLAP_GRADER_JAVA";
/// Checker jar override.
pub const JAR_ENV: &str = "JFLAP_GRADER_JAR";
/// Default time budget for one test file, in seconds.
pub const TIME_LIMIT_ENV: &str = "JFLAP_GRADER_TIME_LIMIT_SECS";
/// Rhai operation limit per hook call.
pub const HOOK_MAX_OPERATIONS_ENV: &str = "JFLAP_GRADER_HOOK_MAX_OPERATIONS";

/// Runtime configuration shared across the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigState {
    /// Java launcher used to run the checker.
    java:                OsString,
    /// Path to the checker jar.
    checker_jar:         PathBuf,
    /// Default time budget for grading one test file.
    time_limit:          Option<Duration>,
    /// Rhai operation limit per hook call.
    hook_max_operations: u64,
}

impl ConfigState {
    /// Construct a new configuration instance from the environment.
    fn new() -> Result<Self> {
        let java = match std::env::var_os(JAVA_ENV) {
            Some(java) if !java.is_empty() => java,
            _ => default_java(),
        };
        let checker_jar = match std::env::var_os(JAR_ENV) {
            Some(jar) if !jar.is_empty() => PathBuf::from(jar),
            _ => bundled_checker_jar(),
        };

        Ok(Self {
            java,
            checker_jar,
            time_limit: read_timeout_secs(TIME_LIMIT_ENV)?,
            hook_max_operations: read_u64(HOOK_MAX_OPERATIONS_ENV)?
                .unwrap_or(DEFAULT_HOOK_MAX_OPERATIONS),
        })
    }

    /// Configuration that ignores the environment entirely.
    fn fallback() -> Self {
        Self {
            java:                default_java(),
            checker_jar:         bundled_checker_jar(),
            time_limit:          None,
            hook_max_operations: DEFAULT_HOOK_MAX_OPERATIONS,
        }
    }

    /// Returns the Java launcher.
    pub fn java(&self) -> &OsString {
        &self.java
    }

    /// Returns the checker jar path.
    pub fn checker_jar(&self) -> &Path {
        &self.checker_jar
    }

    /// Returns the default time budget for one test file, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Returns the Rhai operation limit per hook call.
    pub fn hook_max_operations(&self) -> u64 {
        self.hook_max_operations
    }
}

/// `java` from the path, or the bare name if `which` finds nothing.
fn default_java() -> OsString {
    java_path().unwrap_or_else(|_| OsString::from("java"))
}

/// Shared configuration handle used throughout the crate.
#[derive(Debug, Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
///
/// Fails when one of the numeric environment variables is set but not a
/// number.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let mut guard = slot().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(ConfigState::new()?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Returns the active configuration, initializing it on demand. An invalid
/// environment is logged and replaced by the defaults.
pub fn get() -> ConfigHandle {
    ensure_initialized().unwrap_or_else(|e| {
        warn!("{e:#}; using default configuration");
        let cfg = Arc::new(ConfigState::fallback());
        *slot().lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&cfg));
        ConfigHandle(cfg)
    })
}

/// Returns the configured Java launcher.
pub fn java() -> OsString {
    get().java().clone()
}

/// Returns the configured checker jar path.
pub fn checker_jar() -> PathBuf {
    get().checker_jar().to_path_buf()
}

/// Returns the configured default time budget.
pub fn time_limit() -> Option<Duration> {
    get().time_limit()
}

/// Returns the configured Rhai operation limit.
pub fn hook_max_operations() -> u64 {
    get().hook_max_operations()
}

/// Parses an environment variable holding (possibly fractional) seconds.
/// Unset or blank means no limit.
fn read_timeout_secs(env: &str) -> Result<Option<Duration>> {
    let Some(value) = non_blank(env) else {
        return Ok(None);
    };
    let secs = value
        .parse::<f64>()
        .with_context(|| format!("{env} must be a number of seconds, got '{value}'"))?;
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .with_context(|| format!("{env} must be a non-negative number of seconds, got '{value}'"))
}

/// Parses an environment variable holding an unsigned integer.
fn read_u64(env: &str) -> Result<Option<u64>> {
    non_blank(env)
        .map(|value| {
            value
                .parse::<u64>()
                .with_context(|| format!("{env} must be a whole number, got '{value}'"))
        })
        .transpose()
}

/// Trimmed value of an environment variable, `None` when unset or blank.
fn non_blank(env: &str) -> Option<String> {
    std::env::var(env)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
