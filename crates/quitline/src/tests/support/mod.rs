//! Test doubles shared by the lifecycle suites.

mod buffer;
mod dispatcher;
mod scm;
mod signals;

pub use buffer::SharedBuffer;
pub use dispatcher::{FailingDispatcher, InlineDispatcher};
pub use scm::ScriptedScm;
pub use signals::RecordingSignalInstaller;

use std::sync::Arc;

use crate::config::{LifecycleMode, ServiceConfig};
use crate::context::LifecycleContext;
use crate::sink::LogSink;

/// Program name used by every test context.
pub const PROGRAM: &str = "quitline-test";

/// Builds a context in `mode` whose sink writes into `buffer`.
pub fn context_in(mode: LifecycleMode, buffer: &SharedBuffer) -> Arc<LifecycleContext> {
    let config = ServiceConfig::new(PROGRAM)
        .expect("test program name should be valid")
        .with_mode(mode);
    let sink = LogSink::from_writer(PROGRAM, buffer.clone());
    Arc::new(LifecycleContext::with_sink(config, sink))
}
