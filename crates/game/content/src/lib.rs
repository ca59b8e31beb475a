//! Data-driven configuration and content definitions for spell progress sync.
//!
//! This crate houses the static inputs of the runtime:
//! - Stable identifiers shared with the game object model ([`FormId`], [`SpellIndex`])
//! - Plugin configuration (data-driven via TOML)
//! - The built-in Forgotten Magic spell index table
//! - World fixtures describing forms and script state (data-driven via RON)
//!
//! Content is consumed by the runtime catalog and never mutated after load.

pub mod config;
pub mod ids;
pub mod spell_table;
pub mod world;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use config::{
    CatalogConfig, DebounceConfig, HotkeyConfig, MatchMode, PluginConfig, ProgressSourceConfig,
};
pub use ids::{FormId, SpellIndex};
pub use spell_table::{FORGOTTEN_MAGIC_ESP, forgotten_magic_spell_indices};
pub use world::{BookRecord, EffectRecord, ScriptState, SpellRecord, WorldData};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, WorldLoader};
