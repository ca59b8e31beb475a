//! Topic-based event bus for runtime events.
//!
//! Observers subscribe to the topics they care about: catalog lifecycle or
//! per-batch progress. Publishing never blocks the publisher.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CatalogEvent, ProgressEvent};
