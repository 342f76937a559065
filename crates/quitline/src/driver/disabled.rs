//! Foreground mode with no OS integration.

use std::sync::Arc;

use super::{LAUNCH_MESSAGE, LifecycleDriver, QUIT_MESSAGE, WorkFn};
use crate::config::LifecycleMode;
use crate::context::LifecycleContext;
use crate::error::LifecycleError;

/// Invokes the work function directly. The quit query always answers
/// `false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledDriver;

impl LifecycleDriver for DisabledDriver {
    fn mode(&self) -> LifecycleMode {
        LifecycleMode::Disabled
    }

    fn run(&self, context: &Arc<LifecycleContext>, work: WorkFn) -> Result<(), LifecycleError> {
        context.begin()?;
        let sink = context.sink();
        sink.debug(LAUNCH_MESSAGE);
        work();
        sink.debug(QUIT_MESSAGE);
        Ok(())
    }
}
