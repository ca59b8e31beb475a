//! Contracts for reading the game object model and mutating display names.
//!
//! The engine owns every form; the runtime only sees records keyed by
//! [`FormId`] and never holds references to live engine objects.

mod memory;

pub use memory::InMemoryContent;

use spell_content::{BookRecord, FormId, SpellRecord};

/// Read-only view over the loaded game content.
pub trait ContentSource: Send + Sync {
    /// Whether a content package with this filename is loaded.
    fn is_package_loaded(&self, package: &str) -> bool;

    /// Whether the form is defined by the given content package.
    fn belongs_to_package(&self, form: FormId, package: &str) -> bool;

    /// All granting items (spell tomes) across every package.
    fn books(&self) -> Vec<BookRecord>;

    /// All spells across every package, with their current display names.
    fn spells(&self) -> Vec<SpellRecord>;

    /// Look up a single spell.
    fn spell(&self, id: FormId) -> Option<SpellRecord>;
}

/// Sink for externally visible display-name changes.
///
/// Setting the same name twice must leave the displayed state unchanged.
pub trait DisplayNameSink: Send + Sync {
    fn display_name(&self, form: FormId) -> Option<String>;

    fn set_display_name(&self, form: FormId, name: &str);
}
