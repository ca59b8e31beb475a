//! Runtime for debounced spell progress synchronization.
//!
//! This crate watches magic-effect applications coming from the game, waits
//! for each tracked spell to go quiet, then reads the experience arrays kept
//! by the content package's script and rewrites the spell's display name to
//! show a progress percentage. Consumers embed [`SpellProgressService`], feed
//! it events through [`EffectIngest`] and [`HotkeyIngest`], and observe it
//! through [`EventBus`] and [`SyncMetrics`].
//!
//! Modules are organized by responsibility:
//! - [`service`] hosts the orchestrator and builder
//! - [`api`] exposes the error types downstream clients interact with
//! - [`catalog`] maps content package spells to progress-array rows
//! - [`content`] and [`script`] define the engine collaborators and their in-memory fakes
//! - [`progress`] reads and validates experience rows
//! - [`queue`], [`processor`], and [`ingest`] form the synchronization pipeline
//! - [`events`] provides a topic-based event bus for observers
//! - [`workers`] keeps the background thread internal to the crate
pub mod api;
pub mod catalog;
pub mod content;
pub mod events;
pub mod ingest;
pub mod processor;
pub mod progress;
pub mod queue;
pub mod script;
pub mod service;

mod workers;

pub use api::{BatchError, Result, RowError, ServiceError, SourceError};
pub use catalog::{CatalogLoadResult, SpellCatalog, TrackedSpell};
pub use content::{ContentSource, DisplayNameSink, InMemoryContent};
pub use events::{CatalogEvent, Event, EventBus, ProgressEvent, Topic};
pub use ingest::{EffectIngest, HotkeyIngest, IgnoreReason, IngestOutcome};
pub use processor::{BatchProcessor, BatchReport, SingleFlight, SkipReason, SpellOutcome};
pub use progress::{
    InMemoryProgressSource, ProgressReading, ProgressSource, ProgressTable, ScriptProgressSource,
    progress_display_name,
};
pub use queue::{DebounceQueue, ProcessingBatch};
pub use script::{InMemoryScriptVm, ObjectHandle, ScriptValue, ScriptVm};
pub use service::{ServiceBuilder, SpellProgressService};
pub use workers::{MetricsSnapshot, RunFlag, SyncMetrics};

pub use spell_content::{FormId, PluginConfig, SpellIndex};
