//! Defines the unified error surface for lifecycle drivers.

use std::io;

use strum::Display;
use thiserror::Error;

use crate::config::LifecycleMode;
use crate::driver::signal::SignalError;

/// Exit code used for fatal errors that carry no platform code.
pub const GENERIC_FAILURE_CODE: i32 = 1;

/// Service Control Manager call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ScmOperation {
    /// Handing the dispatch table to the SCM.
    #[strum(to_string = "starting the service dispatcher")]
    StartDispatcher,
    /// Registering the control-handler callback.
    #[strum(to_string = "registering the service control handler")]
    RegisterControlHandler,
    /// Creating the stop event.
    #[strum(to_string = "creating the stop event")]
    CreateStopEvent,
    /// Reporting a status record.
    #[strum(to_string = "reporting service status")]
    ReportStatus,
}

/// Errors reported by the Service Control Manager bindings.
#[derive(Debug, Error)]
pub enum ScmError {
    /// The platform call failed with an OS error.
    #[error("{operation} failed: {source}")]
    Platform {
        /// Call that failed.
        operation: ScmOperation,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The call failed without an OS error code.
    #[error("{operation} failed: {message}")]
    Rejected {
        /// Call that failed.
        operation: ScmOperation,
        /// Description supplied by the binding.
        message: String,
    },
}

impl ScmError {
    /// Call that failed.
    #[must_use]
    pub const fn operation(&self) -> ScmOperation {
        match self {
            Self::Platform { operation, .. } | Self::Rejected { operation, .. } => *operation,
        }
    }

    /// Platform error code, when the failure carried one.
    #[must_use]
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Platform { source, .. } => source.raw_os_error(),
            Self::Rejected { .. } => None,
        }
    }
}

/// Errors surfaced while running a lifecycle driver.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The context already invoked its work function.
    #[error("work function already ran for this process")]
    AlreadyRan,
    /// The requested mode is not available in this build.
    #[error("lifecycle mode '{mode}' is not supported on this platform")]
    UnsupportedMode {
        /// Requested mode.
        mode: LifecycleMode,
    },
    /// Installing the termination handlers failed.
    #[error("failed to install quit signal handlers: {source}")]
    Signal {
        /// Underlying signal error.
        #[source]
        source: SignalError,
    },
    /// The SCM refused the dispatch table.
    #[error("failed to load the service table: {source}")]
    Dispatcher {
        /// Underlying SCM error.
        #[source]
        source: ScmError,
    },
    /// Registering the control handler failed.
    #[error("failed to register the service control handler: {source}")]
    Registration {
        /// Underlying SCM error.
        #[source]
        source: ScmError,
    },
    /// The stop event could not be created.
    #[error("failed to create the stop event: {source}")]
    StopEvent {
        /// Underlying SCM error.
        #[source]
        source: ScmError,
    },
    /// The worker thread could not be started.
    #[error("failed to start the worker thread: {source}")]
    WorkerSpawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl LifecycleError {
    /// Process exit code for this failure.
    ///
    /// Registration failures surface the platform error code; everything
    /// else maps to [`GENERIC_FAILURE_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Dispatcher { source } | Self::Registration { source } => {
                source.os_code().unwrap_or(GENERIC_FAILURE_CODE)
            }
            _ => GENERIC_FAILURE_CODE,
        }
    }
}

impl From<SignalError> for LifecycleError {
    fn from(source: SignalError) -> Self {
        Self::Signal { source }
    }
}

/// Maps a driver result onto the process exit code.
#[must_use]
pub fn exit_code(result: &Result<(), LifecycleError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(error) => error.exit_code(),
    }
}
