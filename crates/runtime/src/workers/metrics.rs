//! Synchronization metrics and statistics.
//!
//! Tracks batch throughput, per-spell outcomes, and pending queue depth.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Sync metrics tracked by the batch processor and debounce worker.
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Batches that opened the progress source and ran to completion
    batches_processed: AtomicU64,

    /// Batches aborted because the progress source was unavailable
    batches_aborted: AtomicU64,

    /// Spells whose display name was rewritten
    spells_updated: AtomicU64,

    /// Spells whose display name already matched
    spells_unchanged: AtomicU64,

    /// Spells skipped because of an invalid row or missing entry
    spells_skipped: AtomicU64,

    /// Spells waiting for their idle threshold
    pending_depth: AtomicU64,

    /// Peak pending depth observed
    peak_pending_depth: AtomicU64,

    /// Total time spent inside completed batches, in nanoseconds
    total_batch_time_nanos: AtomicU64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed batch and its per-spell outcomes.
    pub fn record_batch(&self, updated: u64, unchanged: u64, skipped: u64, elapsed: Duration) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.spells_updated.fetch_add(updated, Ordering::Relaxed);
        self.spells_unchanged.fetch_add(unchanged, Ordering::Relaxed);
        self.spells_skipped.fetch_add(skipped, Ordering::Relaxed);
        self.total_batch_time_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.batches_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates pending depth and tracks peak.
    pub fn set_pending_depth(&self, depth: u64) {
        self.pending_depth.store(depth, Ordering::Relaxed);
        self.peak_pending_depth.fetch_max(depth, Ordering::Relaxed);
    }

    pub fn batches_processed(&self) -> u64 {
        self.batches_processed.load(Ordering::Relaxed)
    }

    pub fn batches_aborted(&self) -> u64 {
        self.batches_aborted.load(Ordering::Relaxed)
    }

    pub fn spells_updated(&self) -> u64 {
        self.spells_updated.load(Ordering::Relaxed)
    }

    pub fn spells_unchanged(&self) -> u64 {
        self.spells_unchanged.load(Ordering::Relaxed)
    }

    pub fn spells_skipped(&self) -> u64 {
        self.spells_skipped.load(Ordering::Relaxed)
    }

    pub fn pending_depth(&self) -> u64 {
        self.pending_depth.load(Ordering::Relaxed)
    }

    pub fn peak_pending_depth(&self) -> u64 {
        self.peak_pending_depth.load(Ordering::Relaxed)
    }

    /// Average wall time of a completed batch.
    pub fn avg_batch_time(&self) -> Duration {
        let processed = self.batches_processed();
        if processed == 0 {
            Duration::ZERO
        } else {
            let total_nanos = self.total_batch_time_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / processed)
        }
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Fields are read individually, so the snapshot may mix values from
    /// concurrent updates.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_processed: self.batches_processed(),
            batches_aborted: self.batches_aborted(),
            spells_updated: self.spells_updated(),
            spells_unchanged: self.spells_unchanged(),
            spells_skipped: self.spells_skipped(),
            pending_depth: self.pending_depth(),
            peak_pending_depth: self.peak_pending_depth(),
            avg_batch_time: self.avg_batch_time(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_processed: u64,
    pub batches_aborted: u64,
    pub spells_updated: u64,
    pub spells_unchanged: u64,
    pub spells_skipped: u64,
    pub pending_depth: u64,
    pub peak_pending_depth: u64,
    pub avg_batch_time: Duration,
}
