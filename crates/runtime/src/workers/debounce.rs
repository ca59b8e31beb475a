//! Debounce worker.
//!
//! Waits for queue activity, promotes idle spells into a batch, and hands the
//! batch to the processor. Runs until the shared [`RunFlag`] is cleared.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{RunFlag, SyncMetrics};
use crate::api::BatchError;
use crate::processor::BatchProcessor;
use crate::queue::DebounceQueue;

pub const WORKER_THREAD_NAME: &str = "spell-progress-worker";

pub struct DebounceWorker {
    queue: Arc<DebounceQueue>,
    processor: Arc<BatchProcessor>,
    run: RunFlag,
    poll_interval: Duration,
    metrics: Arc<SyncMetrics>,
}

impl DebounceWorker {
    pub fn new(
        queue: Arc<DebounceQueue>,
        processor: Arc<BatchProcessor>,
        run: RunFlag,
        poll_interval: Duration,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            queue,
            processor,
            run,
            poll_interval,
            metrics,
        }
    }

    /// Spawn the worker on its own named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Main worker loop.
    pub fn run(self) {
        info!(
            "DebounceWorker started (idle threshold: {:?}, poll: {:?})",
            self.queue.idle_threshold(),
            self.poll_interval
        );

        while self.run.is_running() {
            self.queue.wait_for_activity(self.poll_interval);
            if !self.run.is_running() {
                break;
            }

            let batch = self.queue.take_idle(Instant::now());
            self.metrics.set_pending_depth(self.queue.len() as u64);
            if batch.is_empty() {
                continue;
            }

            debug!("{} spells went idle", batch.len());
            match self.processor.process(batch) {
                Ok(report) => debug!(
                    "Batch done: {} updated, {} unchanged, {} skipped",
                    report.updated(),
                    report.unchanged(),
                    report.skipped()
                ),
                Err(BatchError::ShuttingDown) => break,
                // Already logged by the processor; the spells wait for new activity.
                Err(BatchError::Source(_)) => {}
                Err(e) => warn!("Batch failed: {}", e),
            }
        }

        let dropped = self.queue.clear();
        self.metrics.set_pending_depth(0);
        if dropped > 0 {
            debug!("Dropped {} pending spells on shutdown", dropped);
        }
        info!("DebounceWorker stopped");
    }
}
