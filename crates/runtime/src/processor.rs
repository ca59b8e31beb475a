//! Single-flight batch processor.
//!
//! Applies progress to display names for one [`ProcessingBatch`] at a time.
//! The progress source and the display-name sink are only ever touched while
//! holding the [`SingleFlight`] gate, so batches never interleave.

use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use spell_content::FormId;
use tracing::{debug, info, warn};

use crate::api::{BatchError, RowError, SourceError};
use crate::catalog::{CatalogLoadResult, SpellCatalog};
use crate::content::DisplayNameSink;
use crate::events::{CatalogEvent, Event, EventBus, ProgressEvent};
use crate::progress::{ProgressReading, ProgressSource, ProgressTable};
use crate::queue::ProcessingBatch;
use crate::workers::{RunFlag, SyncMetrics};

/// Bounded wait so gate waiters observe shutdown even without a notify.
const GATE_POLL: Duration = Duration::from_millis(50);

/// Mutex + condvar gate admitting one holder at a time.
pub struct SingleFlight {
    busy: Mutex<bool>,
    released: Condvar,
}

/// Proof of holding the gate. Releases it on drop, including during unwinding.
pub struct FlightPermit<'a> {
    gate: &'a SingleFlight,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            busy: Mutex::new(false),
            released: Condvar::new(),
        }
    }

    /// Wait for the gate and take it.
    ///
    /// While another holder is in flight the caller blocks; if `run` is
    /// cleared during the wait the caller gives up with
    /// [`BatchError::ShuttingDown`]. An uncontended gate is always granted.
    pub fn acquire(&self, run: &RunFlag) -> Result<FlightPermit<'_>, BatchError> {
        let mut busy = self.busy.lock().map_err(|_| BatchError::LockPoisoned)?;
        while *busy {
            if !run.is_running() {
                return Err(BatchError::ShuttingDown);
            }
            let (guard, _) = self
                .released
                .wait_timeout(busy, GATE_POLL)
                .map_err(|_| BatchError::LockPoisoned)?;
            busy = guard;
        }
        *busy = true;
        Ok(FlightPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake every waiter so it can re-check the run flag.
    pub fn wake_all(&self) {
        self.released.notify_all();
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        let mut busy = self
            .gate
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *busy = false;
        drop(busy);
        self.gate.released.notify_all();
    }
}

/// Why a spell in a batch was left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The spell is not in the current catalog.
    Untracked,
    /// The row could not be read from the source.
    Source(SourceError),
    /// The row was read but failed validation.
    Row(RowError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Untracked => write!(f, "spell is not tracked"),
            SkipReason::Source(e) => write!(f, "{e}"),
            SkipReason::Row(e) => write!(f, "{e}"),
        }
    }
}

/// Result of syncing one spell.
#[derive(Debug, Clone, PartialEq)]
pub enum SpellOutcome {
    Updated {
        spell: FormId,
        name: String,
        percent: u8,
    },
    /// The sink already displayed the computed name.
    Unchanged { spell: FormId },
    Skipped { spell: FormId, reason: SkipReason },
}

/// Per-spell outcomes of one batch, in batch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<SpellOutcome>,
}

impl BatchReport {
    pub fn updated(&self) -> usize {
        self.count(|outcome| matches!(outcome, SpellOutcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|outcome| matches!(outcome, SpellOutcome::Unchanged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, SpellOutcome::Skipped { .. }))
    }

    fn count(&self, predicate: impl Fn(&SpellOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Reads progress and rewrites display names, one batch at a time.
pub struct BatchProcessor {
    catalog: Arc<RwLock<SpellCatalog>>,
    source: Arc<dyn ProgressSource>,
    sink: Arc<dyn DisplayNameSink>,
    gate: SingleFlight,
    run: RunFlag,
    events: EventBus,
    metrics: Arc<SyncMetrics>,
}

impl BatchProcessor {
    pub fn new(
        catalog: Arc<RwLock<SpellCatalog>>,
        source: Arc<dyn ProgressSource>,
        sink: Arc<dyn DisplayNameSink>,
        run: RunFlag,
        events: EventBus,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            catalog,
            source,
            sink,
            gate: SingleFlight::new(),
            run,
            events,
            metrics,
        }
    }

    /// Process a batch under the single-flight gate.
    ///
    /// The source is opened once; if that fails the whole batch is abandoned
    /// before any spell is touched. Individual bad rows are skipped.
    pub fn process(&self, batch: ProcessingBatch) -> Result<BatchReport, BatchError> {
        let _permit = self.gate.acquire(&self.run)?;
        let started = Instant::now();
        debug!("Processing batch of {} spells", batch.len());
        self.events
            .publish(Event::Progress(ProgressEvent::BatchStarted { size: batch.len() }));

        let table = match self.source.open() {
            Ok(table) => table,
            Err(error) => {
                warn!("Progress source unavailable, skipping batch: {}", error);
                self.metrics.record_abort();
                self.events
                    .publish(Event::Progress(ProgressEvent::BatchAborted {
                        size: batch.len(),
                        error: error.to_string(),
                    }));
                return Err(BatchError::Source(error));
            }
        };

        let catalog = self.catalog.read().map_err(|_| BatchError::LockPoisoned)?;
        let outcomes = batch
            .spells()
            .iter()
            .map(|&spell| self.sync_spell(&catalog, &table, spell))
            .collect();
        drop(catalog);

        let report = BatchReport { outcomes };
        let elapsed = started.elapsed();
        self.metrics.record_batch(
            report.updated() as u64,
            report.unchanged() as u64,
            report.skipped() as u64,
            elapsed,
        );
        self.events
            .publish(Event::Progress(ProgressEvent::BatchCompleted {
                updated: report.updated(),
                unchanged: report.unchanged(),
                skipped: report.skipped(),
                elapsed_ms: elapsed.as_millis() as u64,
            }));
        Ok(report)
    }

    fn sync_spell(
        &self,
        catalog: &SpellCatalog,
        table: &ProgressTable,
        spell: FormId,
    ) -> SpellOutcome {
        let Some(tracked) = catalog.get(spell) else {
            return self.skip(spell, SkipReason::Untracked);
        };

        let reading = match table.read_row(tracked.index) {
            Ok((current, required)) => ProgressReading::compute(current, required),
            Err(error) => return self.skip(spell, SkipReason::Source(error)),
        };
        let reading = match reading {
            Ok(reading) => reading,
            Err(error) => return self.skip(spell, SkipReason::Row(error)),
        };

        let name = reading.display_name(&tracked.original_name);
        debug!(
            "Progress: {} ({} / {}) for {}",
            reading.percent, reading.current_xp, reading.required_xp, tracked.original_name
        );

        if self.sink.display_name(spell).as_deref() == Some(name.as_str()) {
            return SpellOutcome::Unchanged { spell };
        }

        self.sink.set_display_name(spell, &name);
        debug!("Set name of {} to `{}`", spell, name);
        self.events
            .publish(Event::Progress(ProgressEvent::SpellUpdated {
                spell,
                name: name.clone(),
                percent: reading.percent,
            }));
        SpellOutcome::Updated {
            spell,
            name,
            percent: reading.percent,
        }
    }

    fn skip(&self, spell: FormId, reason: SkipReason) -> SpellOutcome {
        warn!("Skipping {}: {}", spell, reason);
        self.events
            .publish(Event::Progress(ProgressEvent::SpellSkipped {
                spell,
                reason: reason.to_string(),
            }));
        SpellOutcome::Skipped { spell, reason }
    }

    /// Restore every catalogued spell to its original name.
    ///
    /// Runs under the gate so it never races a batch. Returns how many names
    /// actually changed.
    pub fn reset_names(&self) -> Result<usize, BatchError> {
        let _permit = self.gate.acquire(&self.run)?;
        let catalog = self.catalog.read().map_err(|_| BatchError::LockPoisoned)?;
        Ok(self.restore_names(&catalog))
    }

    /// Swap in a freshly built catalog while holding the gate.
    ///
    /// Names tracked by the outgoing catalog are restored before `load` runs,
    /// so the new catalog captures unsuffixed originals. Names tracked by the
    /// incoming catalog are restored afterwards.
    ///
    /// The catalog write lock is held only for the swap itself; ingest
    /// handlers keep reading the outgoing catalog while `load` runs.
    pub fn replace_catalog<F>(&self, load: F) -> Result<CatalogLoadResult, BatchError>
    where
        F: FnOnce() -> (SpellCatalog, CatalogLoadResult),
    {
        let _permit = self.gate.acquire(&self.run)?;

        {
            let outgoing = self.catalog.read().map_err(|_| BatchError::LockPoisoned)?;
            self.restore_names(&outgoing);
        }

        let (fresh, result) = load();
        *self.catalog.write().map_err(|_| BatchError::LockPoisoned)? = fresh;

        {
            let incoming = self.catalog.read().map_err(|_| BatchError::LockPoisoned)?;
            self.restore_names(&incoming);
        }

        self.events.publish(Event::Catalog(CatalogEvent::Loaded {
            package_found: result.package_found,
            configured: result.configured,
            matched: result.matched,
        }));
        Ok(result)
    }

    fn restore_names(&self, catalog: &SpellCatalog) -> usize {
        let mut restored = 0;
        for tracked in catalog.iter() {
            let current = self.sink.display_name(tracked.spell);
            if current.as_deref() != Some(tracked.original_name.as_str()) {
                self.sink.set_display_name(tracked.spell, &tracked.original_name);
                restored += 1;
            }
        }

        if restored > 0 {
            info!("Restored {} spell names", restored);
        }
        self.events
            .publish(Event::Catalog(CatalogEvent::NamesReset { restored }));
        restored
    }

    /// Wake any caller waiting on the gate so it can observe shutdown.
    pub fn wake_waiters(&self) {
        self.gate.wake_all();
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }
}
