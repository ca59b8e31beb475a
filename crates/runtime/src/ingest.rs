//! Entry points for game events.
//!
//! Engine callbacks arrive on arbitrary threads. Each handler only filters
//! and records activity; the heavy lifting happens on the worker thread.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use spell_content::{FormId, HotkeyConfig};
use tracing::{debug, trace};

use crate::catalog::SpellCatalog;
use crate::content::ContentSource;
use crate::queue::DebounceQueue;
use crate::workers::{RunFlag, SyncMetrics};

/// Why an event produced no activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The service is not running.
    Stopped,
    /// The caster is known not to be the player.
    NotPlayer,
    /// The effect is not defined by the tracked content package.
    ForeignPackage,
    /// The effect does not belong to any tracked spell.
    Untracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The owning spell was touched in the debounce queue.
    Queued(FormId),
    Ignored(IgnoreReason),
}

/// Handler for "magic effect applied" events.
#[derive(Clone)]
pub struct EffectIngest {
    catalog: Arc<RwLock<SpellCatalog>>,
    content: Arc<dyn ContentSource>,
    queue: Arc<DebounceQueue>,
    run: RunFlag,
    metrics: Arc<SyncMetrics>,
}

impl EffectIngest {
    pub(crate) fn new(
        catalog: Arc<RwLock<SpellCatalog>>,
        content: Arc<dyn ContentSource>,
        queue: Arc<DebounceQueue>,
        run: RunFlag,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            catalog,
            content,
            queue,
            run,
            metrics,
        }
    }

    /// Handle one effect application.
    ///
    /// `caster_is_player` is `None` when the event carries no caster; such
    /// events are not filtered on the caster. Never blocks beyond the queue's
    /// short critical section.
    pub fn on_effect_applied(&self, effect: FormId, caster_is_player: Option<bool>) -> IngestOutcome {
        if !self.run.is_running() {
            return IngestOutcome::Ignored(IgnoreReason::Stopped);
        }
        if caster_is_player == Some(false) {
            return IngestOutcome::Ignored(IgnoreReason::NotPlayer);
        }

        let spell = {
            let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
            if !self.content.belongs_to_package(effect, catalog.package()) {
                return IngestOutcome::Ignored(IgnoreReason::ForeignPackage);
            }
            catalog.spell_for_effect(effect)
        };

        match spell {
            Some(spell) => {
                trace!("Effect {} maps to {}", effect, spell);
                let depth = self.queue.touch(spell, Instant::now());
                self.metrics.set_pending_depth(depth as u64);
                IngestOutcome::Queued(spell)
            }
            None => IngestOutcome::Ignored(IgnoreReason::Untracked),
        }
    }
}

/// Handler for keyboard events that force a refresh of every tracked spell.
#[derive(Clone)]
pub struct HotkeyIngest {
    catalog: Arc<RwLock<SpellCatalog>>,
    queue: Arc<DebounceQueue>,
    run: RunFlag,
    metrics: Arc<SyncMetrics>,
    keycode: u32,
    cooldown: Duration,
    last_accepted: Arc<Mutex<Option<Instant>>>,
}

impl HotkeyIngest {
    pub(crate) fn new(
        catalog: Arc<RwLock<SpellCatalog>>,
        queue: Arc<DebounceQueue>,
        run: RunFlag,
        metrics: Arc<SyncMetrics>,
        config: &HotkeyConfig,
    ) -> Self {
        Self {
            catalog,
            queue,
            run,
            metrics,
            keycode: config.refresh_keycode,
            cooldown: config.cooldown(),
            last_accepted: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle a button press observed at `at`.
    ///
    /// Returns whether the press was accepted. Presses within the cooldown of
    /// the last accepted press are dropped.
    pub fn on_button(&self, keycode: u32, at: Instant) -> bool {
        if keycode != self.keycode || !self.run.is_running() {
            return false;
        }

        {
            let mut last = self
                .last_accepted
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = *last
                && at.saturating_duration_since(previous) < self.cooldown
            {
                trace!("Refresh key within cooldown, ignoring");
                return false;
            }
            *last = Some(at);
        }

        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        let mut depth = 0;
        for spell in catalog.spell_ids() {
            depth = self.queue.touch(spell, at);
        }
        self.metrics.set_pending_depth(depth as u64);
        debug!("Refresh key queued {} spells", catalog.len());
        true
    }
}
