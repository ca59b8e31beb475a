//! Progress reads against the content package's experience arrays.
//!
//! A [`ProgressSource`] is opened once per batch, producing a [`ProgressTable`]
//! snapshot of both arrays. Rows are then validated individually so one bad
//! cell only costs the spell it belongs to.

mod memory;
mod reading;
mod source;

pub use memory::InMemoryProgressSource;
pub use reading::{ProgressReading, progress_display_name};
pub use source::{ProgressSource, ProgressTable, ScriptProgressSource};
