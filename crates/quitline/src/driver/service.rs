//! Windows service mode: the SCM owns the mainline.

use std::sync::Arc;

use super::{LAUNCH_MESSAGE, LifecycleDriver, QUIT_MESSAGE, WorkFn};
use crate::config::LifecycleMode;
use crate::context::LifecycleContext;
use crate::error::{LifecycleError, ScmError};

/// Hands the service table to the SCM.
pub trait ServiceDispatcher: Send + Sync {
    /// Blocks until the SCM has run and stopped the service.
    ///
    /// The outer error means the table was refused; the inner result is the
    /// outcome of the service main.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError`] when the dispatcher cannot be started.
    fn dispatch(
        &self,
        context: &Arc<LifecycleContext>,
        work: WorkFn,
    ) -> Result<Result<(), LifecycleError>, ScmError>;
}

/// Runs the work function under SCM control.
#[derive(Debug, Clone)]
pub struct ServiceDriver<D> {
    dispatcher: D,
}

impl<D: ServiceDispatcher> ServiceDriver<D> {
    /// Driver handing the service table to `dispatcher`.
    #[must_use]
    pub const fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }
}

impl<D: ServiceDispatcher> LifecycleDriver for ServiceDriver<D> {
    fn mode(&self) -> LifecycleMode {
        LifecycleMode::WindowsService
    }

    fn run(&self, context: &Arc<LifecycleContext>, work: WorkFn) -> Result<(), LifecycleError> {
        context.begin()?;
        let sink = context.sink();
        sink.debug(LAUNCH_MESSAGE);
        let outcome = match self.dispatcher.dispatch(context, work) {
            Ok(outcome) => outcome,
            Err(source) => {
                sink.error(format_args!("main: failed loading the service table: {source}"));
                return Err(LifecycleError::Dispatcher { source });
            }
        };
        sink.debug(QUIT_MESSAGE);
        outcome
    }
}

#[cfg(windows)]
pub(crate) fn system_driver() -> Result<Box<dyn LifecycleDriver>, LifecycleError> {
    Ok(Box::new(ServiceDriver::new(
        crate::scm::windows::WindowsDispatcher,
    )))
}

#[cfg(not(windows))]
pub(crate) fn system_driver() -> Result<Box<dyn LifecycleDriver>, LifecycleError> {
    Err(LifecycleError::UnsupportedMode {
        mode: LifecycleMode::WindowsService,
    })
}
