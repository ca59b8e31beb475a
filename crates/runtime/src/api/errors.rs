//! Unified error types surfaced by the runtime API.
//!
//! Failures are layered by blast radius: a [`RowError`] skips one spell, a
//! [`SourceError`] at open time aborts one batch, and a [`ServiceError`] is
//! reported to whoever drives the service lifecycle. None of them are fatal to
//! the host process.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// The script-side progress data could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("controller `{editor_id}` not found")]
    ControllerMissing { editor_id: String },

    #[error("script `{script}` is not attached to `{editor_id}`")]
    ScriptMissing { editor_id: String, script: String },

    #[error("property `{name}` is missing")]
    PropertyMissing { name: String },

    #[error("property `{name}` is not an array")]
    NotAnArray { name: String },

    #[error("index {index} is out of bounds for `{name}` (length {len})")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("`{name}[{index}]` is not numeric")]
    WrongType { name: String, index: usize },

    #[error("progress source unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A progress row was read but its values cannot produce a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RowError {
    #[error("current experience {current} is negative")]
    NegativeCurrent { current: f32 },

    #[error("required experience {required} is not positive")]
    NonPositiveRequired { required: f32 },

    #[error("experience values are not finite")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("batch aborted, progress source unavailable")]
    Source(#[from] SourceError),

    #[error("service is shutting down")]
    ShuttingDown,

    #[error("batch processor lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service worker is already running")]
    AlreadyRunning,

    #[error("service requires a {component} before building")]
    NotConfigured { component: &'static str },

    #[error("failed to spawn service worker")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("service worker panicked")]
    WorkerPanicked,

    #[error("catalog lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Batch(#[from] BatchError),
}
