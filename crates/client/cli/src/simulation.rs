//! Replays casts against the service using in-memory collaborators.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use spell_content::{PluginConfig, WorldData};
use spell_progress::{
    ContentSource, DisplayNameSink, Event, InMemoryContent, InMemoryScriptVm, IngestOutcome,
    ProgressEvent, ProgressSource, ScriptProgressSource, SpellProgressService, Topic,
    TrackedSpell,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{Cast, SimConfig};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Simulator {
    plugin: PluginConfig,
    content: Arc<InMemoryContent>,
    vm: Arc<InMemoryScriptVm>,
    service: SpellProgressService,
}

impl Simulator {
    pub fn new(plugin: PluginConfig, world: &WorldData) -> Result<Self> {
        let content = Arc::new(InMemoryContent::from_world(world));
        let vm = Arc::new(InMemoryScriptVm::from_scripts(&world.scripts));

        let service = SpellProgressService::builder()
            .config(plugin.clone())
            .content(content.clone())
            .sink(content.clone())
            .script_vm(vm.clone())
            .build()?;

        Ok(Self {
            plugin,
            content,
            vm,
            service,
        })
    }

    pub async fn run(&self, sim: &SimConfig) -> Result<()> {
        let loaded = self.service.on_data_loaded()?;
        if !loaded.package_found {
            warn!("{} is not loaded, nothing to simulate", self.plugin.package_filename);
            return Ok(());
        }
        println!(
            "Catalog: {}/{} configured entries matched",
            loaded.matched, loaded.configured
        );
        for name in &loaded.unmatched {
            println!("  unmatched: {name}");
        }

        let catalog = self.service.catalog()?;
        let observer = self.spawn_observer();
        self.service.start()?;

        let casts = if sim.casts.is_empty() {
            catalog
                .iter()
                .map(|tracked| Cast {
                    spell: tracked.original_name.clone(),
                    xp: sim.default_xp,
                })
                .collect()
        } else {
            sim.casts.clone()
        };

        let ingest = self.service.ingest();
        for cast in &casts {
            let Some(tracked) = catalog
                .iter()
                .find(|tracked| tracked.original_name.eq_ignore_ascii_case(&cast.spell))
            else {
                warn!("`{}` is not a tracked spell, skipping cast", cast.spell);
                continue;
            };

            self.grant_xp(tracked, cast.xp)?;
            let Some(effect) = self
                .content
                .spell(tracked.spell)
                .and_then(|spell| spell.effects.first().copied())
            else {
                warn!("`{}` has no magic effects to apply", cast.spell);
                continue;
            };

            match ingest.on_effect_applied(effect, Some(true)) {
                IngestOutcome::Queued(spell) => info!("Cast {} (+{} XP)", spell, cast.xp),
                IngestOutcome::Ignored(reason) => warn!("Cast ignored: {:?}", reason),
            }
            tokio::time::sleep(sim.cast_interval).await;
        }

        self.settle().await;
        self.service.stop()?;
        observer.abort();

        println!();
        println!("Display names:");
        for tracked in catalog.iter() {
            let name = self
                .content
                .display_name(tracked.spell)
                .unwrap_or_else(|| tracked.original_name.clone());
            println!("  [{:>2}] {:<28} {}", tracked.index, tracked.original_name, name);
        }

        let metrics = self.service.metrics().snapshot();
        println!();
        println!(
            "Batches: {} processed, {} aborted (avg {:?})",
            metrics.batches_processed, metrics.batches_aborted, metrics.avg_batch_time
        );
        println!(
            "Spells: {} updated, {} unchanged, {} skipped (peak pending {})",
            metrics.spells_updated,
            metrics.spells_unchanged,
            metrics.spells_skipped,
            metrics.peak_pending_depth
        );
        Ok(())
    }

    /// Wait for pending casts to go idle and for the last batch to finish.
    async fn settle(&self) {
        let debounce = &self.plugin.debounce;
        tokio::time::sleep(debounce.idle_threshold() + debounce.poll_interval() * 2).await;

        let processor = self.service.processor();
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        while (self.service.pending() > 0 || processor.is_busy()) && Instant::now() < deadline {
            tokio::time::sleep(debounce.poll_interval()).await;
        }
    }

    /// Add XP to the spell's row of the controller script.
    fn grant_xp(&self, tracked: &TrackedSpell, xp: f32) -> Result<()> {
        let progress = &self.plugin.progress;
        let table = ScriptProgressSource::new(self.vm.clone(), progress.clone())
            .open()
            .context("reading controller script")?;
        let (current, _) = table.read_row(tracked.index)?;

        self.vm.set_float(
            &progress.controller_editor_id,
            &progress.script_name,
            &progress.current_xp_property,
            tracked.index.as_usize(),
            current + xp,
        );
        Ok(())
    }

    fn spawn_observer(&self) -> JoinHandle<()> {
        let mut events = self.service.subscribe(Topic::Progress);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(Event::Progress(ProgressEvent::SpellUpdated { spell, name, .. })) => {
                        info!("{} is now `{}`", spell, name);
                    }
                    Ok(Event::Progress(ProgressEvent::SpellSkipped { spell, reason })) => {
                        warn!("{} skipped: {}", spell, reason);
                    }
                    Ok(Event::Progress(ProgressEvent::BatchAborted { size, error })) => {
                        warn!("Batch of {} aborted: {}", size, error);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => warn!("Observer lagged by {} events", missed),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
