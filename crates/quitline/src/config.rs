//! Service configuration: lifecycle mode, program name, and log destination.
//!
//! The lifecycle mode is fixed for the lifetime of a process run. It defaults
//! to the platform's native integration and may be overridden from the
//! environment so the same binary can be launched interactively.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::defaults::{
    LOG_FILTER_ENV_VAR, LOG_ROOT_ENV_VAR, MODE_ENV_VAR, default_log_filter_string,
    default_log_root,
};

/// How the process integrates with its host.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LifecycleMode {
    /// No OS integration; the quit query always answers `false`.
    Disabled,
    /// Termination signals latch the quit state.
    PosixSignal,
    /// The Service Control Manager drives the lifecycle.
    WindowsService,
}

impl LifecycleMode {
    /// Mode selected by the build configuration.
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(feature = "disabled") {
            Self::Disabled
        } else if cfg!(windows) {
            Self::WindowsService
        } else {
            Self::PosixSignal
        }
    }
}

impl Default for LifecycleMode {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Errors raised while assembling a [`ServiceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The program name cannot be used as a log file stem.
    #[error("invalid program name '{name}': {reason}")]
    InvalidProgramName {
        /// Rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
    /// The mode override did not name a known mode.
    #[error("unknown lifecycle mode '{value}' in {variable}")]
    UnknownMode {
        /// Environment variable holding the value.
        variable: &'static str,
        /// Rejected value.
        value: String,
    },
    /// An override was not valid Unicode.
    #[error("environment variable {variable} is not valid unicode")]
    NotUnicode {
        /// Offending variable.
        variable: &'static str,
    },
}

/// Settings consumed by the lifecycle drivers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceConfig {
    program_name: String,
    #[serde(default)]
    mode: LifecycleMode,
    #[serde(default = "default_log_root")]
    log_root: PathBuf,
    #[serde(default = "default_log_filter_string")]
    log_filter: String,
}

impl ServiceConfig {
    /// Builds a configuration with platform defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProgramName`] when the name is empty or
    /// contains a path separator.
    pub fn new(program_name: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            program_name: validate_program_name(program_name.into())?,
            mode: LifecycleMode::platform_default(),
            log_root: default_log_root(),
            log_filter: default_log_filter_string(),
        })
    }

    /// Builds a configuration and applies the `QUITLINE_*` overrides.
    ///
    /// # Errors
    ///
    /// Fails when the program name is invalid or an override cannot be
    /// parsed.
    pub fn from_env(program_name: impl Into<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new(program_name)?;
        if let Some(value) = read_var(MODE_ENV_VAR)? {
            config.mode = value.parse().map_err(|_| ConfigError::UnknownMode {
                variable: MODE_ENV_VAR,
                value,
            })?;
        }
        if let Some(root) = env::var_os(LOG_ROOT_ENV_VAR).filter(|root| !root.is_empty()) {
            config.log_root = PathBuf::from(root);
        }
        if let Some(filter) = read_var(LOG_FILTER_ENV_VAR)? {
            config.log_filter = filter;
        }
        Ok(config)
    }

    /// Replaces the lifecycle mode.
    #[must_use]
    pub fn with_mode(mut self, mode: LifecycleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the directory that receives the log file.
    #[must_use]
    pub fn with_log_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.log_root = root.into();
        self
    }

    /// Replaces the `tracing` filter directive.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Name prefixed to every log line and registered with the SCM.
    #[must_use]
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Active lifecycle mode.
    #[must_use]
    pub const fn mode(&self) -> LifecycleMode {
        self.mode
    }

    /// Directory that receives the log file.
    #[must_use]
    pub fn log_root(&self) -> &Path {
        &self.log_root
    }

    /// Filter directive for `tracing` events.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// `<log_root>/<program_name>.log`.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log_root.join(format!("{}.log", self.program_name))
    }
}

fn validate_program_name(name: String) -> Result<String, ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else {
        None
    };
    if let Some(reason) = reason {
        return Err(ConfigError::InvalidProgramName { name, reason });
    }
    Ok(name)
}

fn read_var(variable: &'static str) -> Result<Option<String>, ConfigError> {
    env::var_os(variable)
        .filter(|value| !value.is_empty())
        .map(OsString::into_string)
        .transpose()
        .map_err(|_| ConfigError::NotUnicode { variable })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("disabled", LifecycleMode::Disabled)]
    #[case("posix_signal", LifecycleMode::PosixSignal)]
    #[case("WINDOWS_SERVICE", LifecycleMode::WindowsService)]
    fn parses_mode_names(#[case] text: &str, #[case] expected: LifecycleMode) {
        let mode: LifecycleMode = text.parse().expect("mode should parse");
        assert_eq!(mode, expected);
    }

    #[test]
    fn mode_displays_in_snake_case() {
        assert_eq!(LifecycleMode::PosixSignal.to_string(), "posix_signal");
    }

    #[test]
    fn log_path_joins_root_and_program_name() {
        let config = ServiceConfig::new("ticker")
            .expect("name should be valid")
            .with_log_root("/srv/logs");
        assert_eq!(config.log_path(), PathBuf::from("/srv/logs/ticker.log"));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("bin/ticker")]
    #[case("bin\\ticker")]
    fn rejects_unusable_program_names(#[case] name: &str) {
        let error = ServiceConfig::new(name).expect_err("name should be rejected");
        assert!(matches!(error, ConfigError::InvalidProgramName { .. }));
    }

    #[test]
    fn deserialises_with_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{ "program_name": "ticker", "mode": "disabled" }"#)
                .expect("config should deserialise");
        assert_eq!(config.mode(), LifecycleMode::Disabled);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_root(), default_log_root().as_path());
    }
}
