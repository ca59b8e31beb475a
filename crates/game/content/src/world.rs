//! Plain-data description of a game world.
//!
//! Used to seed in-memory content sources and script VMs, both in tests and in
//! the simulator binary. Nothing here talks to a live engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::FormId;

/// A snapshot of forms and script state, usually loaded from RON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldData {
    /// Filenames of the content packages that are loaded.
    pub packages: Vec<String>,
    pub spells: Vec<SpellRecord>,
    pub books: Vec<BookRecord>,
    pub effects: Vec<EffectRecord>,
    /// Script instances attached to controller quests.
    pub scripts: Vec<ScriptState>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellRecord {
    pub id: FormId,
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub effects: Vec<FormId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: FormId,
    pub name: String,
    pub package: String,
    /// Spell learned when the book is read.
    #[serde(default)]
    pub teaches: Option<FormId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub id: FormId,
    pub name: String,
    pub package: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptState {
    pub controller_editor_id: String,
    pub script_name: String,
    #[serde(default)]
    pub float_arrays: BTreeMap<String, Vec<f32>>,
}
