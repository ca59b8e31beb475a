//! Public runtime API surface.
//!
//! Gathers the error taxonomy exposed to consumers so the pipeline modules can
//! stay focused on synchronization.

pub mod errors;

pub use errors::{BatchError, Result, RowError, ServiceError, SourceError};
