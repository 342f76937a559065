//! Cooperative quit state shared between the notification context and the
//! work function.
//!
//! The latch is a single atomic boolean. Writers only ever store `true`, so
//! once a quit has been requested every later read observes it. A signal
//! handler may set it directly because the store is lock-free and allocates
//! nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;

/// Latched quit flag owned by the active lifecycle mode.
#[derive(Debug, Clone, Default)]
pub struct QuitLatch {
    flag: Arc<AtomicBool>,
}

impl QuitLatch {
    /// Builds an unset latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches the quit request. Idempotent.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Reports whether a quit has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Flag handed to signal registration; the handler stores `true` into it.
    pub(crate) fn shared_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Read-only view of the quit state handed to work functions.
#[derive(Debug, Clone)]
pub struct QuitProbe {
    source: ProbeSource,
}

#[derive(Debug, Clone)]
enum ProbeSource {
    Never,
    Latch(QuitLatch),
}

impl QuitProbe {
    /// Probe that never reports a quit request.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            source: ProbeSource::Never,
        }
    }

    /// Probe observing the given latch.
    #[must_use]
    pub fn watching(latch: &QuitLatch) -> Self {
        Self {
            source: ProbeSource::Latch(latch.clone()),
        }
    }

    /// Returns `true` once a cooperative quit has been requested. Never blocks.
    #[must_use]
    pub fn shall_quit(&self) -> bool {
        match &self.source {
            ProbeSource::Never => false,
            ProbeSource::Latch(latch) => latch.is_requested(),
        }
    }
}

static PROCESS_PROBE: OnceCell<QuitProbe> = OnceCell::new();

/// Publishes the probe answered by [`shall_quit`]. Only the first call wins;
/// returns `false` when a probe was already published.
pub(crate) fn publish(probe: QuitProbe) -> bool {
    PROCESS_PROBE.set(probe).is_ok()
}

/// Process-wide quit query.
///
/// Answers for the context started by [`crate::run`]; returns `false` when no
/// run has begun.
#[must_use]
pub fn shall_quit() -> bool {
    PROCESS_PROBE.get().is_some_and(QuitProbe::shall_quit)
}
