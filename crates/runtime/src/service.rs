//! High-level service orchestrator.
//!
//! The service owns the catalog, the debounce queue, the batch processor, and
//! the background worker thread. Engine glue calls the lifecycle hooks and
//! forwards game events through the [`EffectIngest`] and [`HotkeyIngest`]
//! handles.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use spell_content::PluginConfig;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::api::{Result, ServiceError};
use crate::catalog::{CatalogLoadResult, SpellCatalog};
use crate::content::{ContentSource, DisplayNameSink};
use crate::events::{Event, EventBus, Topic};
use crate::ingest::{EffectIngest, HotkeyIngest};
use crate::processor::BatchProcessor;
use crate::progress::{ProgressSource, ScriptProgressSource};
use crate::queue::DebounceQueue;
use crate::script::ScriptVm;
use crate::workers::{DebounceWorker, RunFlag, SyncMetrics};

/// Debounced spell progress synchronization.
///
/// Design: the service owns all shared state; ingest handles are cheap clones
/// that only touch the queue.
pub struct SpellProgressService {
    config: PluginConfig,
    content: Arc<dyn ContentSource>,
    catalog: Arc<RwLock<SpellCatalog>>,
    queue: Arc<DebounceQueue>,
    processor: Arc<BatchProcessor>,
    effects: EffectIngest,
    hotkey: HotkeyIngest,
    run: RunFlag,
    events: EventBus,
    metrics: Arc<SyncMetrics>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SpellProgressService {
    /// Create a new service builder
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// Build the catalog from the loaded game data.
    ///
    /// Call once the engine reports that all data files are loaded. A missing
    /// content package is not an error; the catalog stays empty and every
    /// event is filtered.
    pub fn on_data_loaded(&self) -> Result<CatalogLoadResult> {
        self.reload_catalog()
    }

    /// Start the background worker.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock().map_err(|_| ServiceError::LockPoisoned)?;
        if worker.is_some() {
            return Err(ServiceError::AlreadyRunning);
        }

        self.run.set_running(true);
        let spawned = DebounceWorker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.processor),
            self.run.clone(),
            self.config.debounce.poll_interval(),
            Arc::clone(&self.metrics),
        )
        .spawn();

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!("Spell progress service started");
                Ok(())
            }
            Err(e) => {
                self.run.set_running(false);
                error!("Failed to spawn worker: {}", e);
                Err(ServiceError::WorkerSpawn(e))
            }
        }
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Idempotent. Pending activity is dropped; a batch already in flight
    /// finishes before the join returns.
    pub fn stop(&self) -> Result<()> {
        self.run.set_running(false);
        self.queue.wake_all();
        self.processor.wake_waiters();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        handle.join().map_err(|_| ServiceError::WorkerPanicked)?;
        info!("Spell progress service stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.run.is_running()
    }

    /// Number of spells waiting for their idle threshold.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// A new game was started. Restores names and rebuilds the catalog.
    pub fn on_new_game(&self) -> Result<CatalogLoadResult> {
        info!("New game, resetting spell names");
        self.reset_for_session()
    }

    /// A save finished loading. Restores names and rebuilds the catalog.
    pub fn on_post_load_game(&self) -> Result<CatalogLoadResult> {
        info!("Save loaded, resetting spell names");
        self.reset_for_session()
    }

    fn reset_for_session(&self) -> Result<CatalogLoadResult> {
        let dropped = self.queue.clear();
        if dropped > 0 {
            info!("Dropped {} pending spells", dropped);
        }
        self.metrics.set_pending_depth(0);
        self.reload_catalog()
    }

    fn reload_catalog(&self) -> Result<CatalogLoadResult> {
        let config = &self.config;
        let content = self.content.as_ref();
        let result = self
            .processor
            .replace_catalog(|| SpellCatalog::load(config, content))?;
        Ok(result)
    }

    /// Cloneable handle for magic-effect events.
    pub fn ingest(&self) -> EffectIngest {
        self.effects.clone()
    }

    /// Cloneable handle for refresh-key events.
    pub fn hotkey(&self) -> HotkeyIngest {
        self.hotkey.clone()
    }

    pub fn metrics(&self) -> Arc<SyncMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// Subscribe to one event topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn processor(&self) -> Arc<BatchProcessor> {
        Arc::clone(&self.processor)
    }

    /// Copy of the current catalog.
    pub fn catalog(&self) -> Result<SpellCatalog> {
        self.catalog
            .read()
            .map(|catalog| catalog.clone())
            .map_err(|_| ServiceError::LockPoisoned)
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }
}

impl Drop for SpellProgressService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop spell progress service: {}", e);
        }
    }
}

/// Builder for [`SpellProgressService`].
pub struct ServiceBuilder {
    config: PluginConfig,
    content: Option<Arc<dyn ContentSource>>,
    progress_source: Option<Arc<dyn ProgressSource>>,
    script_vm: Option<Arc<dyn ScriptVm>>,
    sink: Option<Arc<dyn DisplayNameSink>>,
    event_buffer_size: usize,
}

impl ServiceBuilder {
    fn new() -> Self {
        Self {
            config: PluginConfig::default(),
            content: None,
            progress_source: None,
            script_vm: None,
            sink: None,
            event_buffer_size: 100,
        }
    }

    /// Override plugin configuration
    pub fn config(mut self, config: PluginConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required content source
    pub fn content(mut self, content: Arc<dyn ContentSource>) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the progress source explicitly.
    ///
    /// Takes precedence over [`Self::script_vm`].
    pub fn progress_source(mut self, source: Arc<dyn ProgressSource>) -> Self {
        self.progress_source = Some(source);
        self
    }

    /// Read progress from the controller script through `vm`, using the
    /// property names in the configuration.
    pub fn script_vm(mut self, vm: Arc<dyn ScriptVm>) -> Self {
        self.script_vm = Some(vm);
        self
    }

    /// Set required display-name sink
    pub fn sink(mut self, sink: Arc<dyn DisplayNameSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    /// Build the service. The worker is not started.
    pub fn build(self) -> Result<SpellProgressService> {
        let content = self.content.ok_or(ServiceError::NotConfigured {
            component: "content source",
        })?;
        let sink = self.sink.ok_or(ServiceError::NotConfigured {
            component: "display-name sink",
        })?;
        let source: Arc<dyn ProgressSource> = match (self.progress_source, self.script_vm) {
            (Some(source), _) => source,
            (None, Some(vm)) => Arc::new(ScriptProgressSource::new(vm, self.config.progress.clone())),
            (None, None) => {
                return Err(ServiceError::NotConfigured {
                    component: "progress source",
                });
            }
        };

        let config = self.config;
        let run = RunFlag::new();
        let events = EventBus::with_capacity(self.event_buffer_size);
        let metrics = Arc::new(SyncMetrics::new());
        let catalog = Arc::new(RwLock::new(SpellCatalog::empty(
            config.package_filename.as_str(),
        )));
        let queue = Arc::new(DebounceQueue::new(config.debounce.idle_threshold()));

        let processor = Arc::new(BatchProcessor::new(
            Arc::clone(&catalog),
            source,
            sink,
            run.clone(),
            events.clone(),
            Arc::clone(&metrics),
        ));
        let effects = EffectIngest::new(
            Arc::clone(&catalog),
            Arc::clone(&content),
            Arc::clone(&queue),
            run.clone(),
            Arc::clone(&metrics),
        );
        let hotkey = HotkeyIngest::new(
            Arc::clone(&catalog),
            Arc::clone(&queue),
            run.clone(),
            Arc::clone(&metrics),
            &config.hotkey,
        );

        Ok(SpellProgressService {
            config,
            content,
            catalog,
            queue,
            processor,
            effects,
            hotkey,
            run,
            events,
            metrics,
            worker: Mutex::new(None),
        })
    }
}
