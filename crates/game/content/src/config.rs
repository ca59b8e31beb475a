//! Plugin configuration and tunable parameters.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::spell_table::FORGOTTEN_MAGIC_ESP;

/// Top-level plugin configuration.
///
/// Every section falls back to its defaults when absent from the file, so an
/// empty document is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Filename of the content package whose spells are tracked.
    pub package_filename: String,
    pub catalog: CatalogConfig,
    pub progress: ProgressSourceConfig,
    pub debounce: DebounceConfig,
    pub hotkey: HotkeyConfig,
    /// Name to progress-array index table. Keys are granting item names or
    /// spell names depending on [`CatalogConfig::match_by`].
    pub spell_indices: BTreeMap<String, u32>,
}

impl PluginConfig {
    pub fn new() -> Self {
        Self {
            package_filename: FORGOTTEN_MAGIC_ESP.to_string(),
            catalog: CatalogConfig::default(),
            progress: ProgressSourceConfig::default(),
            debounce: DebounceConfig::default(),
            hotkey: HotkeyConfig::default(),
            spell_indices: BTreeMap::new(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How configured names are matched against scanned content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Match the display name of the book that teaches the spell, exactly.
    #[default]
    GrantingItem,
    /// Match the display name of the spell itself, ignoring case.
    SpellName,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub match_by: MatchMode,
}

/// Location of the experience arrays inside the scripting VM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSourceConfig {
    /// Editor id of the quest the progress script is attached to.
    pub controller_editor_id: String,
    pub script_name: String,
    /// Float array holding accumulated experience per spell index.
    pub current_xp_property: String,
    /// Float array holding the experience required per spell index.
    pub required_xp_property: String,
}

impl Default for ProgressSourceConfig {
    fn default() -> Self {
        Self {
            controller_editor_id: "vMCM".to_string(),
            script_name: "vMCMscript".to_string(),
            current_xp_property: "fSPXP".to_string(),
            required_xp_property: "fXPreq".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiet period a spell must observe before its progress is synced.
    pub idle_threshold_ms: u64,
    /// Upper bound on how long the worker sleeps between scans.
    pub poll_interval_ms: u64,
}

impl DebounceConfig {
    pub const DEFAULT_IDLE_THRESHOLD_MS: u64 = 1000;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            idle_threshold_ms: Self::DEFAULT_IDLE_THRESHOLD_MS,
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// DirectInput scan code of the refresh key.
    pub refresh_keycode: u32,
    pub cooldown_ms: u64,
}

impl HotkeyConfig {
    /// Caps Lock.
    pub const DEFAULT_REFRESH_KEYCODE: u32 = 0x3A;
    pub const DEFAULT_COOLDOWN_MS: u64 = 500;

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            refresh_keycode: Self::DEFAULT_REFRESH_KEYCODE,
            cooldown_ms: Self::DEFAULT_COOLDOWN_MS,
        }
    }
}
