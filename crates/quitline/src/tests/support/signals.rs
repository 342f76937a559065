//! Signal installer double that lets tests deliver the quit notification.

use std::io;
use std::sync::{Arc, Mutex};

use crate::driver::{SignalError, SignalInstaller};
use crate::quit::QuitLatch;

/// Records the latch it was asked to hook and can trigger it on demand.
#[derive(Debug, Default, Clone)]
pub struct RecordingSignalInstaller {
    latch: Arc<Mutex<Option<QuitLatch>>>,
    fail: bool,
}

impl RecordingSignalInstaller {
    /// Installer whose registration always fails.
    pub fn failing() -> Self {
        Self {
            latch: Arc::default(),
            fail: true,
        }
    }

    /// Whether `install` succeeded.
    pub fn installed(&self) -> bool {
        self.latch.lock().expect("installer mutex poisoned").is_some()
    }

    /// Simulates delivery of the quit notification.
    pub fn deliver(&self) {
        if let Some(latch) = self.latch.lock().expect("installer mutex poisoned").as_ref() {
            latch.request();
        }
    }
}

impl SignalInstaller for RecordingSignalInstaller {
    fn install(&self, latch: &QuitLatch) -> Result<(), SignalError> {
        if self.fail {
            return Err(SignalError::Install {
                signal: 2,
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        *self.latch.lock().expect("installer mutex poisoned") = Some(latch.clone());
        Ok(())
    }
}
