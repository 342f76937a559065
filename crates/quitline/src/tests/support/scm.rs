//! Scripted stand-in for the Service Control Manager.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::{ScmError, ScmOperation};
use crate::quit::QuitLatch;
use crate::scm::{
    ControlHandler, ControlReply, ControlRequest, ServiceControlApi, ServiceState,
    ServiceStatusRecord, StatusHandle, StopEvent,
};

/// One status report as the SCM would have seen it.
#[derive(Debug, Clone, Copy)]
pub struct RecordedStatus {
    pub record: ServiceStatusRecord,
    pub at: Instant,
}

/// Captures every reported status record.
#[derive(Debug, Default, Clone)]
pub struct RecordingStatusHandle {
    reports: Arc<Mutex<Vec<RecordedStatus>>>,
    fail: bool,
}

impl RecordingStatusHandle {
    /// Reports captured so far, oldest first.
    pub fn reports(&self) -> Vec<RecordedStatus> {
        self.reports.lock().expect("status mutex poisoned").clone()
    }
}

impl StatusHandle for RecordingStatusHandle {
    fn report(&self, status: &ServiceStatusRecord) -> Result<(), ScmError> {
        self.reports
            .lock()
            .expect("status mutex poisoned")
            .push(RecordedStatus {
                record: *status,
                at: Instant::now(),
            });
        if self.fail {
            Err(ScmError::Platform {
                operation: ScmOperation::ReportStatus,
                source: io::Error::from_raw_os_error(6),
            })
        } else {
            Ok(())
        }
    }
}

/// SCM double with per-call failure injection.
#[derive(Clone, Default)]
pub struct ScriptedScm {
    handle: RecordingStatusHandle,
    handler: Arc<Mutex<Option<ControlHandler>>>,
    registration_error: Option<i32>,
    stop_event_error: Option<i32>,
}

impl ScriptedScm {
    /// Makes control-handler registration fail with `code`.
    pub fn fail_registration(&mut self, code: i32) {
        self.registration_error = Some(code);
    }

    /// Makes stop-event creation fail with `code`.
    pub fn fail_stop_event(&mut self, code: i32) {
        self.stop_event_error = Some(code);
    }

    /// Makes every status report fail after being recorded.
    pub fn fail_reports(&mut self) {
        self.handle.fail = true;
    }

    /// Status reports seen so far.
    pub fn reports(&self) -> Vec<RecordedStatus> {
        self.handle.reports()
    }

    /// Reported states, in order.
    pub fn states(&self) -> Vec<ServiceState> {
        self.reports()
            .iter()
            .map(|status| status.record.state())
            .collect()
    }

    /// Reported checkpoints, in order.
    pub fn checkpoints(&self) -> Vec<u32> {
        self.reports()
            .iter()
            .map(|status| status.record.checkpoint())
            .collect()
    }

    /// Whether a control handler has been registered.
    pub fn handler_registered(&self) -> bool {
        self.handler.lock().expect("handler mutex poisoned").is_some()
    }

    /// Delivers a control code to the registered handler.
    pub fn send(&self, request: ControlRequest) -> Option<ControlReply> {
        self.handler
            .lock()
            .expect("handler mutex poisoned")
            .as_mut()
            .map(|handler| handler(request))
    }
}

impl ServiceControlApi for ScriptedScm {
    type Handle = RecordingStatusHandle;

    fn register_control_handler(
        &self,
        _service_name: &str,
        handler: ControlHandler,
    ) -> Result<Self::Handle, ScmError> {
        if let Some(code) = self.registration_error {
            return Err(ScmError::Platform {
                operation: ScmOperation::RegisterControlHandler,
                source: io::Error::from_raw_os_error(code),
            });
        }
        *self.handler.lock().expect("handler mutex poisoned") = Some(handler);
        Ok(self.handle.clone())
    }

    fn create_stop_event(&self, latch: &QuitLatch) -> Result<StopEvent, ScmError> {
        match self.stop_event_error {
            Some(code) => Err(ScmError::Platform {
                operation: ScmOperation::CreateStopEvent,
                source: io::Error::from_raw_os_error(code),
            }),
            None => Ok(StopEvent::new(latch)),
        }
    }
}
