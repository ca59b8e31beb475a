//! Background worker that backs the service.
//!
//! A single debounce worker thread scans the pending queue and hands idle
//! spells to the batch processor. Engine callbacks never run on it.

mod debounce;
mod metrics;

pub use debounce::DebounceWorker;
pub use metrics::{MetricsSnapshot, SyncMetrics};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "service is running" flag.
///
/// Cleared on shutdown; the worker loop, gate waits, and ingest all observe it.
#[derive(Debug, Clone, Default)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// A flag in the stopped state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.0.store(running, Ordering::SeqCst);
    }
}
