//! Per-process lifecycle state handed to whichever driver runs.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{LifecycleMode, ServiceConfig};
use crate::error::LifecycleError;
use crate::quit::{QuitLatch, QuitProbe};
use crate::sink::LogSink;

/// Owns the log sink and quit latch for one process run.
///
/// Production code builds exactly one context per process; tests build as
/// many as they need.
#[derive(Debug)]
pub struct LifecycleContext {
    config: ServiceConfig,
    sink: LogSink,
    latch: QuitLatch,
    started: AtomicBool,
}

impl LifecycleContext {
    /// Opens the mode-specific sink and builds the context.
    ///
    /// Disabled mode always logs to standard error; the other modes log to
    /// [`ServiceConfig::log_path`], falling back to standard error.
    #[must_use]
    pub fn open(config: ServiceConfig) -> Self {
        let sink = match config.mode() {
            LifecycleMode::Disabled => LogSink::stderr(config.program_name()),
            LifecycleMode::PosixSignal | LifecycleMode::WindowsService => {
                LogSink::open(config.program_name(), &config.log_path())
            }
        };
        Self::with_sink(config, sink)
    }

    /// Builds a context around an existing sink.
    #[must_use]
    pub fn with_sink(config: ServiceConfig, sink: LogSink) -> Self {
        Self {
            config,
            sink,
            latch: QuitLatch::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Program name used for log lines and SCM registration.
    #[must_use]
    pub fn program_name(&self) -> &str {
        self.config.program_name()
    }

    /// Active lifecycle mode.
    #[must_use]
    pub const fn mode(&self) -> LifecycleMode {
        self.config.mode()
    }

    /// Diagnostic sink.
    #[must_use]
    pub const fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Probe answering the quit query for this context.
    #[must_use]
    pub fn quit_probe(&self) -> QuitProbe {
        match self.mode() {
            LifecycleMode::Disabled => QuitProbe::never(),
            LifecycleMode::PosixSignal | LifecycleMode::WindowsService => {
                QuitProbe::watching(&self.latch)
            }
        }
    }

    /// Returns `true` once a cooperative quit has been requested.
    #[must_use]
    pub fn shall_quit(&self) -> bool {
        self.quit_probe().shall_quit()
    }

    /// Whether a driver has already started on this context.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) const fn latch(&self) -> &QuitLatch {
        &self.latch
    }

    /// Marks the context as started; a second start is refused so the work
    /// function runs at most once.
    pub(crate) fn begin(&self) -> Result<(), LifecycleError> {
        if self.started.swap(true, Ordering::AcqRel) {
            Err(LifecycleError::AlreadyRan)
        } else {
            Ok(())
        }
    }
}
