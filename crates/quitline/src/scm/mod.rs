//! Service Control Manager integration.
//!
//! [`status`] holds the reported record, [`bridge`] the platform-neutral
//! service main, and `windows` the binding to the real SCM.

pub mod bridge;
pub mod status;
#[cfg(windows)]
pub mod windows;

pub use bridge::{
    ControlHandler, ControlReply, ControlRequest, ScmBridge, ServiceControlApi, StatusHandle,
    StopEvent,
};
pub use status::{
    AcceptedControls, ServiceKind, ServiceState, ServiceStatusRecord, Transition, TransitionError,
};
