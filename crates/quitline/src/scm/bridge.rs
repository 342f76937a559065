//! Service main and control handler for the Service Control Manager.
//!
//! The bridge is written against [`ServiceControlApi`] so the state machine
//! runs unchanged against the real SCM on Windows and against recording
//! doubles elsewhere.
//!
//! Sequence driven by [`ScmBridge::service_main`]:
//!
//! 1. Register the control handler. Failure ends the run before any status
//!    is reported.
//! 2. Report `StartPending` and create the stop event. Failure reports
//!    `Stopped` with checkpoint 1 and never starts the worker.
//! 3. Report `Running`, start the worker, and block until it exits.
//! 4. Report `Stopped` with checkpoint 3.
//!
//! The control handler runs on the SCM's thread. On a stop request while
//! running it reports `StopPending` and signals the stop event; it never
//! logs. Anything worth logging is recorded in atomics and written by the
//! mainline once the worker has exited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use once_cell::sync::OnceCell;

use crate::context::LifecycleContext;
use crate::driver::WorkFn;
use crate::error::{GENERIC_FAILURE_CODE, LifecycleError, ScmError};
use crate::quit::QuitLatch;
use crate::scm::status::{ServiceState, ServiceStatusRecord, Transition};
use crate::sink::LogSink;

/// Reports status records to the SCM.
pub trait StatusHandle: Send + Sync + 'static {
    /// Sends the full record.
    ///
    /// # Errors
    ///
    /// Returns the platform failure; callers log it and carry on.
    fn report(&self, status: &ServiceStatusRecord) -> Result<(), ScmError>;
}

/// Control code delivered to the control handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Stop the service.
    Stop,
    /// Report the current status.
    Interrogate,
    /// Any control code the bridge does not act on.
    Other,
}

/// Answer returned to the SCM for a control code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    /// The control was handled.
    Handled,
    /// The control is not implemented by this service.
    NotImplemented,
}

/// Callback registered with the SCM.
pub type ControlHandler = Box<dyn FnMut(ControlRequest) -> ControlReply + Send + 'static>;

/// Platform calls the bridge depends on.
pub trait ServiceControlApi: Send + Sync {
    /// Handle returned by control-handler registration.
    type Handle: StatusHandle;

    /// Registers `handler` for `service_name`.
    ///
    /// # Errors
    ///
    /// Returns the platform failure; the run ends without a worker.
    fn register_control_handler(
        &self,
        service_name: &str,
        handler: ControlHandler,
    ) -> Result<Self::Handle, ScmError>;

    /// Creates the manual-reset stop event bound to `latch`.
    ///
    /// # Errors
    ///
    /// Returns the platform failure; the run reports `Stopped`.
    fn create_stop_event(&self, latch: &QuitLatch) -> Result<StopEvent, ScmError>;
}

/// Manual-reset event signalled when the SCM asks the service to stop.
///
/// Once signalled it stays signalled; the quit query observes it through
/// the shared latch.
#[derive(Debug, Clone)]
pub struct StopEvent {
    latch: QuitLatch,
}

impl StopEvent {
    /// Event backed by `latch`.
    #[must_use]
    pub fn new(latch: &QuitLatch) -> Self {
        Self {
            latch: latch.clone(),
        }
    }

    /// Signals the event.
    pub fn signal(&self) {
        self.latch.request();
    }

    /// Whether the event has been signalled.
    #[must_use]
    pub fn is_signalled(&self) -> bool {
        self.latch.is_requested()
    }
}

struct BridgeState<H> {
    record: Mutex<ServiceStatusRecord>,
    handle: OnceCell<H>,
    stop_event: OnceCell<StopEvent>,
    stop_received: AtomicBool,
    stop_report_failed: AtomicBool,
}

impl<H: StatusHandle> BridgeState<H> {
    fn new() -> Self {
        Self {
            record: Mutex::new(ServiceStatusRecord::start_pending()),
            handle: OnceCell::new(),
            stop_event: OnceCell::new(),
            stop_received: AtomicBool::new(false),
            stop_report_failed: AtomicBool::new(false),
        }
    }

    fn report_current(&self, sink: &LogSink) {
        let record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        let reported = self.report_locked(&record);
        drop(record);
        if let Err(error) = reported {
            sink.error(format_args!("service main: {error}"));
        }
    }

    fn transition(&self, transition: Transition, sink: &LogSink) {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = record
            .apply(transition)
            .map(|()| self.report_locked(&record));
        drop(record);
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => sink.error(format_args!("service main: {error}")),
            Err(error) => sink.error(format_args!("service main: {error}")),
        }
    }

    fn report_locked(&self, record: &ServiceStatusRecord) -> Result<(), ScmError> {
        self.handle
            .get()
            .map_or(Ok(()), |handle| handle.report(record))
    }

    /// Runs on the SCM thread and never logs.
    ///
    /// It does take the record lock. Holding it across the `StopPending`
    /// report keeps that report ordered before the mainline's final
    /// `Stopped` report; the mainline only holds the lock while reporting.
    fn on_stop(&self) {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        if record.state() != ServiceState::Running {
            return;
        }
        if record.apply(Transition::StopRequested).is_err() {
            return;
        }
        self.stop_received.store(true, Ordering::Release);
        if self.report_locked(&record).is_err() {
            self.stop_report_failed.store(true, Ordering::Release);
        }
        drop(record);
        if let Some(event) = self.stop_event.get() {
            event.signal();
        }
    }
}

fn control_handler<H: StatusHandle>(state: Arc<BridgeState<H>>) -> ControlHandler {
    Box::new(move |request| match request {
        ControlRequest::Stop => {
            state.on_stop();
            ControlReply::Handled
        }
        ControlRequest::Interrogate => ControlReply::Handled,
        ControlRequest::Other => ControlReply::NotImplemented,
    })
}

/// Drives one service run against the SCM.
pub struct ScmBridge<A> {
    api: A,
    context: Arc<LifecycleContext>,
}

impl<A: ServiceControlApi> ScmBridge<A> {
    /// Binds `api` to the lifecycle context.
    #[must_use]
    pub const fn new(api: A, context: Arc<LifecycleContext>) -> Self {
        Self { api, context }
    }

    /// Runs the service main sequence, invoking `work` at most once on a
    /// dedicated worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Registration`] when the control handler
    /// cannot be registered, [`LifecycleError::StopEvent`] when the stop event
    /// cannot be created, and [`LifecycleError::WorkerSpawn`] when the worker
    /// thread cannot be started. Status-report failures are logged only.
    pub fn service_main(&self, work: WorkFn) -> Result<(), LifecycleError> {
        let sink = self.context.sink();
        sink.debug("service main: entered");

        let state = Arc::new(BridgeState::<A::Handle>::new());
        let handle = match self
            .api
            .register_control_handler(self.context.program_name(), control_handler(Arc::clone(&state)))
        {
            Ok(handle) => handle,
            Err(source) => {
                sink.error(format_args!(
                    "service main: failed to register the service control handler: {source}"
                ));
                return Err(LifecycleError::Registration { source });
            }
        };
        state.handle.get_or_init(|| handle);
        state.report_current(sink);

        sink.debug("service main: performing start operations");
        let event = match self.api.create_stop_event(self.context.latch()) {
            Ok(event) => event,
            Err(source) => {
                sink.error(format_args!("service main: {source}"));
                let exit_code = failure_code(source.os_code());
                state.transition(Transition::InitFailed { exit_code }, sink);
                sink.debug("service main: exit");
                return Err(LifecycleError::StopEvent { source });
            }
        };
        state.stop_event.get_or_init(|| event);
        state.transition(Transition::Ready, sink);

        let (outcome, exit_code) = self.run_worker(work);

        if state.stop_received.load(Ordering::Acquire) {
            sink.debug("service main: stop requested by the service control manager");
        }
        if state.stop_report_failed.load(Ordering::Acquire) {
            sink.error("service main: failed to report the stop-pending status");
        }
        sink.debug("service main: performing cleanup operations");
        state.transition(Transition::Final { exit_code }, sink);
        sink.debug("service main: exit");
        outcome
    }

    fn run_worker(&self, work: WorkFn) -> (Result<(), LifecycleError>, u32) {
        let sink = self.context.sink();
        let probe = self.context.quit_probe();
        let spawned = thread::Builder::new()
            .name(format!("{}-worker", self.context.program_name()))
            .spawn(move || {
                if !probe.shall_quit() {
                    work();
                }
            });
        match spawned {
            Ok(worker) => {
                sink.debug("service main: waiting for the worker thread to complete");
                if worker.join().is_err() {
                    sink.error("service main: worker thread panicked");
                }
                sink.debug("service main: worker thread finished");
                (Ok(()), 0)
            }
            Err(source) => {
                sink.error(format_args!(
                    "service main: failed to start the worker thread: {source}"
                ));
                let exit_code = failure_code(source.raw_os_error());
                (Err(LifecycleError::WorkerSpawn { source }), exit_code)
            }
        }
    }
}

fn failure_code(code: Option<i32>) -> u32 {
    code.and_then(|code| u32::try_from(code).ok())
        .unwrap_or(GENERIC_FAILURE_CODE.unsigned_abs())
}
