//! Catalog of tracked spells.
//!
//! Built once after game data is loaded by cross-referencing the content
//! package against the configured index table. Immutable afterwards; a reload
//! builds a new catalog and swaps it in.

use std::collections::{BTreeMap, HashMap};

use spell_content::{
    FormId, MatchMode, PluginConfig, SpellIndex, SpellRecord, forgotten_magic_spell_indices,
};
use tracing::{debug, error, info, warn};

use crate::content::ContentSource;

/// A spell whose progress is mirrored into its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSpell {
    pub spell: FormId,
    pub index: SpellIndex,
    /// Display name captured at load, restored at zero progress.
    pub original_name: String,
    /// Granting item that matched the configuration, when matching by book.
    pub source_item: Option<String>,
}

/// Summary of a catalog load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogLoadResult {
    pub package_found: bool,
    /// Number of entries in the index table that was used.
    pub configured: usize,
    /// Number of table entries that matched at least one form.
    pub matched: usize,
    /// Table entries with no matching content, sorted.
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SpellCatalog {
    package: String,
    spells: BTreeMap<FormId, TrackedSpell>,
    effects: HashMap<FormId, FormId>,
}

impl SpellCatalog {
    /// An empty catalog for `package`. Filters every event.
    pub fn empty(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            spells: BTreeMap::new(),
            effects: HashMap::new(),
        }
    }

    /// Scan `content` and build the catalog described by `config`.
    ///
    /// Never fails: a missing package yields an empty catalog and entries
    /// without matching content are reported in the result.
    pub fn load(config: &PluginConfig, content: &dyn ContentSource) -> (Self, CatalogLoadResult) {
        let package = config.package_filename.as_str();
        let mut catalog = Self::empty(package);

        if !content.is_package_loaded(package) {
            error!("Could not find {}, spell progress disabled", package);
            let result = CatalogLoadResult {
                package_found: false,
                configured: config.spell_indices.len(),
                ..CatalogLoadResult::default()
            };
            return (catalog, result);
        }

        info!("Searching for {} spells...", package);
        let result = match config.catalog.match_by {
            MatchMode::GrantingItem => catalog.match_granting_items(config, content),
            MatchMode::SpellName => catalog.match_spell_names(config, content),
        };

        for name in &result.unmatched {
            warn!("No {} content matches configured entry `{}`", package, name);
        }
        catalog.index_effects(content);

        info!(
            matched = result.matched,
            configured = result.configured,
            "Found {} {} spells",
            catalog.len(),
            package
        );
        (catalog, result)
    }

    fn match_granting_items(
        &mut self,
        config: &PluginConfig,
        content: &dyn ContentSource,
    ) -> CatalogLoadResult {
        let table = &config.spell_indices;
        let mut matched_keys: BTreeMap<&str, bool> =
            table.keys().map(|name| (name.as_str(), false)).collect();

        for book in content.books() {
            if book.name.is_empty() || !content.belongs_to_package(book.id, &self.package) {
                continue;
            }
            let Some((key, &index)) = table.get_key_value(book.name.as_str()) else {
                debug!("Book `{}` is not in the index table", book.name);
                continue;
            };
            let Some(spell) = book.teaches.and_then(|id| content.spell(id)) else {
                warn!("Book `{}` does not teach a known spell", book.name);
                continue;
            };

            self.track(&spell, SpellIndex(index), Some(book.name.clone()));
            matched_keys.insert(key.as_str(), true);
        }

        Self::summarize(matched_keys)
    }

    fn match_spell_names(
        &mut self,
        config: &PluginConfig,
        content: &dyn ContentSource,
    ) -> CatalogLoadResult {
        let table: BTreeMap<String, u32> = if config.spell_indices.is_empty() {
            forgotten_magic_spell_indices()
        } else {
            config
                .spell_indices
                .iter()
                .map(|(name, index)| (name.to_lowercase(), *index))
                .collect()
        };
        let mut matched_keys: BTreeMap<&str, bool> =
            table.keys().map(|name| (name.as_str(), false)).collect();

        for spell in content.spells() {
            if spell.name.is_empty() || !content.belongs_to_package(spell.id, &self.package) {
                continue;
            }
            let lowered = spell.name.to_lowercase();
            let Some((key, &index)) = table.get_key_value(lowered.as_str()) else {
                debug!("Spell `{}` is not in the index table", spell.name);
                continue;
            };

            self.track(&spell, SpellIndex(index), None);
            matched_keys.insert(key.as_str(), true);
        }

        Self::summarize(matched_keys)
    }

    /// Insert or update an entry. The original name is captured only once.
    fn track(&mut self, spell: &SpellRecord, index: SpellIndex, source_item: Option<String>) {
        debug!("Tracking `{}` ({}) at index {}", spell.name, spell.id, index);
        self.spells
            .entry(spell.id)
            .and_modify(|tracked| {
                tracked.index = index;
                tracked.source_item = source_item.clone();
            })
            .or_insert_with(|| TrackedSpell {
                spell: spell.id,
                index,
                original_name: spell.name.clone(),
                source_item,
            });
    }

    fn index_effects(&mut self, content: &dyn ContentSource) {
        for &spell_id in self.spells.keys() {
            let Some(spell) = content.spell(spell_id) else {
                continue;
            };
            for effect in spell.effects {
                match self.effects.get(&effect).copied() {
                    Some(owner) if owner != spell_id => {
                        warn!(
                            "Effect {} is shared by {} and {}, keeping {}",
                            effect, owner, spell_id, owner
                        );
                    }
                    Some(_) => {}
                    None => {
                        self.effects.insert(effect, spell_id);
                    }
                }
            }
        }
    }

    fn summarize(matched_keys: BTreeMap<&str, bool>) -> CatalogLoadResult {
        let configured = matched_keys.len();
        let unmatched: Vec<String> = matched_keys
            .iter()
            .filter(|(_, matched)| !**matched)
            .map(|(name, _)| (*name).to_string())
            .collect();

        CatalogLoadResult {
            package_found: true,
            configured,
            matched: configured - unmatched.len(),
            unmatched,
        }
    }

    /// Filename of the content package this catalog tracks.
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn get(&self, spell: FormId) -> Option<&TrackedSpell> {
        self.spells.get(&spell)
    }

    /// Spell that owns the given magic effect, if tracked.
    pub fn spell_for_effect(&self, effect: FormId) -> Option<FormId> {
        self.effects.get(&effect).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSpell> {
        self.spells.values()
    }

    pub fn spell_ids(&self) -> Vec<FormId> {
        self.spells.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}
