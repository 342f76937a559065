//! Built-in defaults and the names of the environment overrides.

use std::path::PathBuf;

/// Directory that receives `<program-name>.log` when no override is supplied.
#[cfg(windows)]
pub const DEFAULT_LOG_ROOT: &str = "C:/log";

/// Directory that receives `<program-name>.log` when no override is supplied.
#[cfg(not(windows))]
pub const DEFAULT_LOG_ROOT: &str = "/var/lib/log";

/// Filesystem root of the host platform.
#[cfg(windows)]
pub const ROOT_DIR: &str = "C:/";

/// Filesystem root of the host platform.
#[cfg(not(windows))]
pub const ROOT_DIR: &str = "/";

/// Default filter directive applied to `tracing` events routed into the sink.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable overriding the lifecycle mode.
pub const MODE_ENV_VAR: &str = "QUITLINE_MODE";

/// Environment variable overriding the log root directory.
pub const LOG_ROOT_ENV_VAR: &str = "QUITLINE_LOG_ROOT";

/// Environment variable overriding the `tracing` filter directive.
pub const LOG_FILTER_ENV_VAR: &str = "QUITLINE_LOG_FILTER";

/// Default log root as an owned path (used by serde).
#[must_use]
pub fn default_log_root() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_ROOT)
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Filesystem root of the host platform as a path.
#[must_use]
pub fn root_dir() -> PathBuf {
    PathBuf::from(ROOT_DIR)
}
