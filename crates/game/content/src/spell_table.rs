//! Built-in spell index table for Forgotten Magic Redone.
//!
//! The package stores experience in arrays ordered by this index. The table
//! is keyed by lowercase spell name and is used when the catalog matches by
//! spell name without an explicit table in the configuration.

use std::collections::BTreeMap;

/// Default content package tracked by the plugin.
pub const FORGOTTEN_MAGIC_ESP: &str = "ForgottenMagic_Redone.esp";

const SPELL_NAMES: [&str; 41] = [
    "fireblast",
    "conflagrate",
    "meteor shower",
    "doppelganger",
    "blight curse",
    "necrosis",
    "void bolt",
    "deathguard",
    "ice lance",
    "frost bomb",
    "ancient lich",
    "frost armor",
    "healing touch",
    "seed of life",
    "earthbound weapon",
    "wild mushroom",
    "divine light",
    "holy bolt",
    "divine armor",
    "hammer of justice",
    "stormstrike",
    "lightning strike",
    "storm armor",
    "skyfall",
    "arcane weapon",
    "cursed rune",
    "discord",
    "phantom shroud",
    "veil of nature",
    "wolf pack",
    "salamander touch",
    "deathly pall",
    "nether rift",
    "phoenix strike",
    "winter woe",
    "glacial fortress",
    "spectral missiles",
    "phantom armor",
    "electric charge",
    "stormgate",
    "blessed weapon",
];

/// Returns the lowercase spell name to index table.
pub fn forgotten_magic_spell_indices() -> BTreeMap<String, u32> {
    SPELL_NAMES
        .iter()
        .zip(0u32..)
        .map(|(name, index)| ((*name).to_string(), index))
        .collect()
}
