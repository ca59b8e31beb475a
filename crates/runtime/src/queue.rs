//! Debounce queue of recently used spells.
//!
//! Every use of a tracked spell overwrites its last-activity time. A spell is
//! promoted into a [`ProcessingBatch`] only once it has been idle for the full
//! threshold, so a burst of casts produces a single sync after the burst ends.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use spell_content::FormId;
use tracing::trace;

/// Spells captured from the pending set at a single scan instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingBatch {
    spells: Vec<FormId>,
    captured_at: Instant,
}

impl ProcessingBatch {
    pub fn new(spells: Vec<FormId>, captured_at: Instant) -> Self {
        Self {
            spells,
            captured_at,
        }
    }

    /// Spells in capture order.
    pub fn spells(&self) -> &[FormId] {
        &self.spells
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}

/// Pending activity guarded by a mutex, with a condvar signalled on touch.
pub struct DebounceQueue {
    pending: Mutex<HashMap<FormId, Instant>>,
    activity: Condvar,
    idle_threshold: Duration,
}

impl DebounceQueue {
    pub fn new(idle_threshold: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            activity: Condvar::new(),
            idle_threshold,
        }
    }

    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }

    // Entries are independent timestamps, so a panic while holding the lock
    // cannot leave the map inconsistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<FormId, Instant>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record activity for `spell`, resetting its idle timer.
    ///
    /// Returns the number of pending spells after the touch.
    pub fn touch(&self, spell: FormId, at: Instant) -> usize {
        let mut pending = self.lock();
        pending
            .entry(spell)
            .and_modify(|last| *last = (*last).max(at))
            .or_insert(at);
        let depth = pending.len();
        drop(pending);

        trace!("touched {}", spell);
        self.activity.notify_one();
        depth
    }

    /// Remove and return every spell idle for at least the threshold at `now`.
    ///
    /// The batch is ordered by last activity, oldest first, with ties broken
    /// by form id.
    pub fn take_idle(&self, now: Instant) -> ProcessingBatch {
        let mut pending = self.lock();

        let mut idle: Vec<(Instant, FormId)> = pending
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= self.idle_threshold)
            .map(|(spell, last)| (*last, *spell))
            .collect();
        for (_, spell) in &idle {
            pending.remove(spell);
        }
        drop(pending);

        idle.sort_unstable();
        ProcessingBatch::new(idle.into_iter().map(|(_, spell)| spell).collect(), now)
    }

    /// Block until activity is signalled or `timeout` elapses.
    ///
    /// The wait is shortened to the moment the oldest pending spell becomes
    /// idle, so eligible spells are picked up without waiting out a full poll.
    pub fn wait_for_activity(&self, timeout: Duration) {
        let pending = self.lock();
        let now = Instant::now();
        let until_due = pending
            .values()
            .filter_map(|last| last.checked_add(self.idle_threshold))
            .map(|due| due.saturating_duration_since(now))
            .min();
        let timeout = until_due.map_or(timeout, |due| due.min(timeout));
        if timeout.is_zero() {
            return;
        }

        let _ = self
            .activity
            .wait_timeout(pending, timeout)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Wake every thread blocked in [`Self::wait_for_activity`].
    pub fn wake_all(&self) {
        self.activity.notify_all();
    }

    /// Drop all pending activity, returning how many spells were dropped.
    pub fn clear(&self) -> usize {
        let mut pending = self.lock();
        let dropped = pending.len();
        pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, spell: FormId) -> bool {
        self.lock().contains_key(&spell)
    }
}
