//! Event types for different topics.

use serde::{Deserialize, Serialize};
use spell_content::FormId;

/// Events related to the spell catalog lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    /// The catalog was (re)built from loaded content
    Loaded {
        package_found: bool,
        configured: usize,
        matched: usize,
    },

    /// Display names were restored to their originals
    NamesReset { restored: usize },
}

/// Events related to progress synchronization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// A batch acquired the single-flight gate
    BatchStarted { size: usize },

    /// A spell's display name was rewritten
    SpellUpdated {
        spell: FormId,
        name: String,
        percent: u8,
    },

    /// A spell was left untouched because its row could not be used
    SpellSkipped { spell: FormId, reason: String },

    /// A batch finished, possibly with skipped spells
    BatchCompleted {
        updated: usize,
        unchanged: usize,
        skipped: usize,
        elapsed_ms: u64,
    },

    /// A batch was abandoned before touching any spell
    BatchAborted { size: usize, error: String },
}
