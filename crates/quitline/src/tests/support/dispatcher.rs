//! Dispatchers that run the service main without a real SCM.

use std::io;
use std::sync::Arc;

use crate::context::LifecycleContext;
use crate::driver::{ServiceDispatcher, WorkFn};
use crate::error::{LifecycleError, ScmError, ScmOperation};
use crate::scm::{ScmBridge, ServiceControlApi};

/// Runs the bridge on the calling thread, as the SCM would after accepting
/// the service table.
#[derive(Clone)]
pub struct InlineDispatcher<A> {
    pub api: A,
}

impl<A> ServiceDispatcher for InlineDispatcher<A>
where
    A: ServiceControlApi + Clone,
{
    fn dispatch(
        &self,
        context: &Arc<LifecycleContext>,
        work: WorkFn,
    ) -> Result<Result<(), LifecycleError>, ScmError> {
        let bridge = ScmBridge::new(self.api.clone(), Arc::clone(context));
        Ok(bridge.service_main(work))
    }
}

/// Refuses the service table with a fixed platform code.
#[derive(Debug, Clone, Copy)]
pub struct FailingDispatcher {
    pub code: i32,
}

impl ServiceDispatcher for FailingDispatcher {
    fn dispatch(
        &self,
        _context: &Arc<LifecycleContext>,
        _work: WorkFn,
    ) -> Result<Result<(), LifecycleError>, ScmError> {
        Err(ScmError::Platform {
            operation: ScmOperation::StartDispatcher,
            source: io::Error::from_raw_os_error(self.code),
        })
    }
}
