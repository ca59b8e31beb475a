//! In-memory content source for tests and the simulator.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use spell_content::{BookRecord, FormId, SpellRecord, WorldData};

use super::{ContentSource, DisplayNameSink};

/// In-memory implementation of [`ContentSource`] and [`DisplayNameSink`].
///
/// Display names live in a single table so that renames made through the sink
/// are visible to later [`ContentSource::spells`] calls, as they would be in
/// the engine.
pub struct InMemoryContent {
    packages: HashSet<String>,
    owners: HashMap<FormId, String>,
    spells: BTreeMap<FormId, SpellRecord>,
    books: Vec<BookRecord>,
    names: RwLock<HashMap<FormId, String>>,
    name_writes: AtomicU64,
}

impl InMemoryContent {
    /// Create an empty content source with no packages loaded.
    pub fn new() -> Self {
        Self {
            packages: HashSet::new(),
            owners: HashMap::new(),
            spells: BTreeMap::new(),
            books: Vec::new(),
            names: RwLock::new(HashMap::new()),
            name_writes: AtomicU64::new(0),
        }
    }

    /// Build a content source from a world fixture.
    pub fn from_world(world: &WorldData) -> Self {
        let mut content = Self::new();
        content.packages.extend(world.packages.iter().cloned());

        let mut names = HashMap::new();
        for effect in &world.effects {
            content.owners.insert(effect.id, effect.package.clone());
            names.insert(effect.id, effect.name.clone());
        }
        for spell in &world.spells {
            content.owners.insert(spell.id, spell.package.clone());
            names.insert(spell.id, spell.name.clone());
            content.spells.insert(spell.id, spell.clone());
        }
        for book in &world.books {
            content.owners.insert(book.id, book.package.clone());
            names.insert(book.id, book.name.clone());
            content.books.push(book.clone());
        }

        content.names = RwLock::new(names);
        content
    }

    /// Number of times [`DisplayNameSink::set_display_name`] has been called.
    pub fn name_writes(&self) -> u64 {
        self.name_writes.load(Ordering::Relaxed)
    }

    fn current_name(&self, form: FormId) -> Option<String> {
        self.names
            .read()
            .ok()
            .and_then(|names| names.get(&form).cloned())
    }

    fn with_current_name(&self, mut spell: SpellRecord) -> SpellRecord {
        if let Some(name) = self.current_name(spell.id) {
            spell.name = name;
        }
        spell
    }
}

impl Default for InMemoryContent {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSource for InMemoryContent {
    fn is_package_loaded(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    fn belongs_to_package(&self, form: FormId, package: &str) -> bool {
        self.owners
            .get(&form)
            .is_some_and(|owner| owner == package)
    }

    fn books(&self) -> Vec<BookRecord> {
        self.books.clone()
    }

    fn spells(&self) -> Vec<SpellRecord> {
        self.spells
            .values()
            .cloned()
            .map(|spell| self.with_current_name(spell))
            .collect()
    }

    fn spell(&self, id: FormId) -> Option<SpellRecord> {
        self.spells
            .get(&id)
            .cloned()
            .map(|spell| self.with_current_name(spell))
    }
}

impl DisplayNameSink for InMemoryContent {
    fn display_name(&self, form: FormId) -> Option<String> {
        self.current_name(form)
    }

    fn set_display_name(&self, form: FormId, name: &str) {
        self.name_writes.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut names) = self.names.write() {
            names.insert(form, name.to_string());
        }
    }
}
