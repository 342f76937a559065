//! Service status record reported to the Service Control Manager.
//!
//! The record only moves forward: `StartPending` to `Running` to
//! `StopPending` to `Stopped`, with `StartPending` allowed to jump straight
//! to `Stopped` when start-up fails. Each transition fixes the accepted
//! controls and the checkpoint value the SCM sees.

use thiserror::Error;

/// Lifecycle state as understood by the SCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    /// Start-up in progress.
    StartPending,
    /// The worker is running.
    Running,
    /// A stop was requested and the worker is winding down.
    StopPending,
    /// The service has stopped.
    Stopped,
}

/// Kind of service process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// The service runs in its own process.
    OwnProcess,
}

/// Control codes the service accepts in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedControls {
    /// No control codes are accepted.
    Nothing,
    /// The stop control code is accepted.
    Stop,
}

/// Forward-only lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The stop event exists; the service is running.
    Ready,
    /// The stop event could not be created.
    InitFailed {
        /// Exit code reported to the SCM.
        exit_code: u32,
    },
    /// The SCM delivered a stop control while running.
    StopRequested,
    /// The worker has exited.
    Final {
        /// Exit code reported to the SCM.
        exit_code: u32,
    },
}

/// Raised when a transition does not apply to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {transition:?} while {from:?}")]
pub struct TransitionError {
    /// State the record was in.
    pub from: ServiceState,
    /// Rejected transition.
    pub transition: Transition,
}

/// Mutable status record owned by the SCM bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatusRecord {
    kind: ServiceKind,
    controls: AcceptedControls,
    state: ServiceState,
    exit_code: u32,
    checkpoint: u32,
}

impl Default for ServiceStatusRecord {
    fn default() -> Self {
        Self::start_pending()
    }
}

impl ServiceStatusRecord {
    /// Initial record: start pending, no controls, checkpoint 0.
    #[must_use]
    pub const fn start_pending() -> Self {
        Self {
            kind: ServiceKind::OwnProcess,
            controls: AcceptedControls::Nothing,
            state: ServiceState::StartPending,
            exit_code: 0,
            checkpoint: 0,
        }
    }

    /// Applies `transition`, leaving the record untouched when it is out of
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the transition does not follow from
    /// the current state.
    pub fn apply(&mut self, transition: Transition) -> Result<(), TransitionError> {
        let (allowed, state, controls, exit_code, checkpoint) = match transition {
            Transition::Ready => (
                self.state == ServiceState::StartPending,
                ServiceState::Running,
                AcceptedControls::Stop,
                0,
                0,
            ),
            Transition::InitFailed { exit_code } => (
                self.state == ServiceState::StartPending,
                ServiceState::Stopped,
                AcceptedControls::Nothing,
                exit_code,
                1,
            ),
            Transition::StopRequested => (
                self.state == ServiceState::Running,
                ServiceState::StopPending,
                AcceptedControls::Nothing,
                0,
                4,
            ),
            Transition::Final { exit_code } => (
                matches!(self.state, ServiceState::Running | ServiceState::StopPending),
                ServiceState::Stopped,
                AcceptedControls::Nothing,
                exit_code,
                3,
            ),
        };
        if !allowed {
            return Err(TransitionError {
                from: self.state,
                transition,
            });
        }
        self.state = state;
        self.controls = controls;
        self.exit_code = exit_code;
        self.checkpoint = checkpoint;
        Ok(())
    }

    /// Kind of service process.
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Control codes currently accepted.
    #[must_use]
    pub const fn controls(&self) -> AcceptedControls {
        self.controls
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ServiceState {
        self.state
    }

    /// Exit code reported with the state.
    #[must_use]
    pub const fn exit_code(&self) -> u32 {
        self.exit_code
    }

    /// Progress checkpoint reported with the state.
    #[must_use]
    pub const fn checkpoint(&self) -> u32 {
        self.checkpoint
    }
}
