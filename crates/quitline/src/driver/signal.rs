//! POSIX mode: termination signals latch the quit flag.

use std::io;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use thiserror::Error;

use super::{LAUNCH_MESSAGE, LifecycleDriver, QUIT_MESSAGE, WorkFn};
use crate::config::LifecycleMode;
use crate::context::LifecycleContext;
use crate::error::LifecycleError;
use crate::quit::QuitLatch;

/// Errors reported while installing quit signal handlers.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Registering a handler failed.
    #[error("failed to register handler for signal {signal}: {source}")]
    Install {
        /// Signal number that could not be hooked.
        signal: i32,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Hooks the notifications that request a cooperative quit.
pub trait SignalInstaller: Send + Sync {
    /// Arranges for `latch` to be set when a quit notification arrives.
    ///
    /// The installed handler may do nothing beyond setting the latch.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] when a handler cannot be registered.
    fn install(&self, latch: &QuitLatch) -> Result<(), SignalError>;
}

/// Installs real handlers through `signal-hook`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSignalInstaller {
    signals: Vec<i32>,
}

impl SystemSignalInstaller {
    /// Installer for an explicit signal set.
    #[must_use]
    pub fn new(signals: impl IntoIterator<Item = i32>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
        }
    }

    /// Signals that latch the quit flag.
    #[must_use]
    pub fn signals(&self) -> &[i32] {
        &self.signals
    }
}

impl Default for SystemSignalInstaller {
    fn default() -> Self {
        Self::new([SIGINT, SIGTERM])
    }
}

impl SignalInstaller for SystemSignalInstaller {
    fn install(&self, latch: &QuitLatch) -> Result<(), SignalError> {
        for &signal in &self.signals {
            // `flag::register` performs a single atomic store from the handler.
            signal_hook::flag::register(signal, latch.shared_flag())
                .map_err(|source| SignalError::Install { signal, source })?;
        }
        Ok(())
    }
}

/// Runs the work function on the calling thread after hooking quit signals.
#[derive(Debug, Clone)]
pub struct SignalDriver<I> {
    installer: I,
}

impl<I: SignalInstaller> SignalDriver<I> {
    /// Driver using `installer` to hook quit notifications.
    #[must_use]
    pub const fn new(installer: I) -> Self {
        Self { installer }
    }
}

impl<I: SignalInstaller> LifecycleDriver for SignalDriver<I> {
    fn mode(&self) -> LifecycleMode {
        LifecycleMode::PosixSignal
    }

    fn run(&self, context: &Arc<LifecycleContext>, work: WorkFn) -> Result<(), LifecycleError> {
        context.begin()?;
        let sink = context.sink();
        sink.debug(LAUNCH_MESSAGE);
        if let Err(error) = self.installer.install(context.latch()) {
            sink.error(format_args!("main: {error}"));
            return Err(error.into());
        }
        work();
        sink.debug(QUIT_MESSAGE);
        Ok(())
    }
}
