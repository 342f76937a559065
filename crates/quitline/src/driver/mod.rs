//! Lifecycle drivers: one entry point, three execution modes.
//!
//! Every driver follows the same outline. It marks the context as started,
//! logs `Launching`, installs whatever quit-detection mechanism the mode
//! needs, invokes the work function at most once, and logs `Quitting`.

pub mod disabled;
pub mod service;
pub mod signal;

use std::sync::Arc;

use crate::config::{LifecycleMode, ServiceConfig};
use crate::context::LifecycleContext;
use crate::error::{LifecycleError, exit_code};
use crate::quit;
use crate::telemetry;

pub use disabled::DisabledDriver;
pub use service::{ServiceDispatcher, ServiceDriver};
pub use signal::{SignalDriver, SignalError, SignalInstaller, SystemSignalInstaller};

/// Application work function: no arguments, no result, run at most once.
pub type WorkFn = Box<dyn FnOnce() + Send + 'static>;

pub(crate) const LAUNCH_MESSAGE: &str = "main: Launching ...";
pub(crate) const QUIT_MESSAGE: &str = "main: Quitting ...";

/// Mode-specific entry mainline.
pub trait LifecycleDriver: Send + Sync {
    /// Mode this driver implements.
    fn mode(&self) -> LifecycleMode;

    /// Runs `work` under this mode's quit-detection mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the run was refused or a fatal
    /// registration step failed; the work function is then not invoked.
    fn run(&self, context: &Arc<LifecycleContext>, work: WorkFn) -> Result<(), LifecycleError>;
}

/// Selects the driver for `mode`.
///
/// # Errors
///
/// Returns [`LifecycleError::UnsupportedMode`] when the mode cannot run on
/// this platform.
pub fn driver_for(mode: LifecycleMode) -> Result<Box<dyn LifecycleDriver>, LifecycleError> {
    match mode {
        LifecycleMode::Disabled => Ok(Box::new(DisabledDriver)),
        LifecycleMode::PosixSignal => Ok(Box::new(SignalDriver::new(
            SystemSignalInstaller::default(),
        ))),
        LifecycleMode::WindowsService => service::system_driver(),
    }
}

/// Runs `work` under the configured lifecycle mode and returns the process
/// exit code.
///
/// Opens the log sink, publishes the quit probe behind
/// [`crate::shall_quit`], and routes `tracing` events into the sink.
#[must_use]
pub fn run<F>(config: ServiceConfig, work: F) -> i32
where
    F: FnOnce() + Send + 'static,
{
    let context = Arc::new(LifecycleContext::open(config));
    run_with_context(&context, Box::new(work))
}

/// Runs `work` on an already-built context.
#[must_use]
pub fn run_with_context(context: &Arc<LifecycleContext>, work: WorkFn) -> i32 {
    if !quit::publish(context.quit_probe()) {
        context
            .sink()
            .debug("main: quit query already bound to an earlier run");
    }
    if let Err(error) = telemetry::initialise(context.sink(), context.config().log_filter()) {
        context.sink().error(format_args!("main: {error}"));
    }
    let result = driver_for(context.mode()).and_then(|driver| driver.run(context, work));
    // Drivers log their own registration failures.
    if let Err(error @ (LifecycleError::UnsupportedMode { .. } | LifecycleError::AlreadyRan)) =
        &result
    {
        context.sink().error(format_args!("main: {error}"));
    }
    exit_code(&result)
}
