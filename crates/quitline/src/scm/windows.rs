//! Binds the SCM bridge to the real Service Control Manager.

use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState as WinServiceState,
    ServiceStatus, ServiceType,
};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};
use windows_service::{define_windows_service, service_dispatcher};

use crate::context::LifecycleContext;
use crate::driver::WorkFn;
use crate::driver::service::ServiceDispatcher;
use crate::error::{LifecycleError, ScmError, ScmOperation};
use crate::quit::QuitLatch;
use crate::scm::bridge::{
    ControlHandler, ControlReply, ControlRequest, ScmBridge, ServiceControlApi, StatusHandle,
    StopEvent,
};
use crate::scm::status::{AcceptedControls, ServiceState, ServiceStatusRecord};

fn scm_error(operation: ScmOperation, error: windows_service::Error) -> ScmError {
    match error {
        windows_service::Error::Winapi(source) => ScmError::Platform { operation, source },
        other => ScmError::Rejected {
            operation,
            message: other.to_string(),
        },
    }
}

/// Status handle returned by the real control-handler registration.
#[derive(Clone, Copy)]
pub struct WindowsStatusHandle(ServiceStatusHandle);

impl StatusHandle for WindowsStatusHandle {
    fn report(&self, status: &ServiceStatusRecord) -> Result<(), ScmError> {
        self.0
            .set_service_status(native_status(status))
            .map_err(|error| scm_error(ScmOperation::ReportStatus, error))
    }
}

fn native_status(status: &ServiceStatusRecord) -> ServiceStatus {
    let current_state = match status.state() {
        ServiceState::StartPending => WinServiceState::StartPending,
        ServiceState::Running => WinServiceState::Running,
        ServiceState::StopPending => WinServiceState::StopPending,
        ServiceState::Stopped => WinServiceState::Stopped,
    };
    let controls_accepted = match status.controls() {
        AcceptedControls::Nothing => ServiceControlAccept::empty(),
        AcceptedControls::Stop => ServiceControlAccept::STOP,
    };
    ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state,
        controls_accepted,
        exit_code: ServiceExitCode::Win32(status.exit_code()),
        checkpoint: status.checkpoint(),
        wait_hint: Duration::default(),
        process_id: None,
    }
}

/// Real SCM calls used by [`ScmBridge`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsScm;

impl ServiceControlApi for WindowsScm {
    type Handle = WindowsStatusHandle;

    fn register_control_handler(
        &self,
        service_name: &str,
        mut handler: ControlHandler,
    ) -> Result<Self::Handle, ScmError> {
        let callback = move |control: ServiceControl| {
            let request = match control {
                ServiceControl::Stop => ControlRequest::Stop,
                ServiceControl::Interrogate => ControlRequest::Interrogate,
                _ => ControlRequest::Other,
            };
            match handler(request) {
                ControlReply::Handled => ServiceControlHandlerResult::NoError,
                ControlReply::NotImplemented => ServiceControlHandlerResult::NotImplemented,
            }
        };
        service_control_handler::register(service_name, callback)
            .map(WindowsStatusHandle)
            .map_err(|error| scm_error(ScmOperation::RegisterControlHandler, error))
    }

    fn create_stop_event(&self, latch: &QuitLatch) -> Result<StopEvent, ScmError> {
        Ok(StopEvent::new(latch))
    }
}

struct PendingService {
    context: Arc<LifecycleContext>,
    work: WorkFn,
}

// The dispatcher only accepts a plain function pointer, so the run is handed
// across through these slots.
static PENDING: Mutex<Option<PendingService>> = Mutex::new(None);
static OUTCOME: Mutex<Option<Result<(), LifecycleError>>> = Mutex::new(None);

define_windows_service!(ffi_service_main, dispatched_service_main);

fn dispatched_service_main(_arguments: Vec<OsString>) {
    let pending = PENDING
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let Some(PendingService { context, work }) = pending else {
        return;
    };
    let outcome = ScmBridge::new(WindowsScm, context).service_main(work);
    *OUTCOME.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
}

/// Hands the service table to the SCM and blocks until the service stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsDispatcher;

impl ServiceDispatcher for WindowsDispatcher {
    fn dispatch(
        &self,
        context: &Arc<LifecycleContext>,
        work: WorkFn,
    ) -> Result<Result<(), LifecycleError>, ScmError> {
        *PENDING.lock().unwrap_or_else(PoisonError::into_inner) = Some(PendingService {
            context: Arc::clone(context),
            work,
        });
        let started = service_dispatcher::start(context.program_name(), ffi_service_main);
        // Drop the hand-off if the SCM never called back.
        drop(PENDING.lock().unwrap_or_else(PoisonError::into_inner).take());
        started.map_err(|error| scm_error(ScmOperation::StartDispatcher, error))?;
        let outcome = OUTCOME.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(outcome.unwrap_or(Ok(())))
    }
}
