//! In-memory ProgressSource implementation for tests.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::api::SourceError;
use crate::script::ScriptValue;

use super::{ProgressSource, ProgressTable};

const CURRENT: &str = "current";
const REQUIRED: &str = "required";

#[derive(Default)]
struct Rows {
    current: Vec<ScriptValue>,
    required: Vec<ScriptValue>,
}

/// Progress source holding both arrays directly, without a script VM.
pub struct InMemoryProgressSource {
    rows: RwLock<Rows>,
    available: AtomicBool,
    opens: AtomicU64,
}

impl InMemoryProgressSource {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows::default()),
            available: AtomicBool::new(true),
            opens: AtomicU64::new(0),
        }
    }

    /// Set one row, growing both arrays with zero rows as needed.
    pub fn set_row(&self, index: usize, current_xp: f32, required_xp: f32) {
        self.set_cells(
            index,
            ScriptValue::Float(current_xp),
            ScriptValue::Float(required_xp),
        );
    }

    /// Set one row to arbitrary script values.
    pub fn set_cells(&self, index: usize, current: ScriptValue, required: ScriptValue) {
        if let Ok(mut rows) = self.rows.write() {
            if rows.current.len() <= index {
                rows.current.resize(index + 1, ScriptValue::Float(0.0));
                rows.required.resize(index + 1, ScriptValue::Float(0.0));
            }
            rows.current[index] = current;
            rows.required[index] = required;
        }
    }

    /// Make subsequent opens fail with [`SourceError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of times the source has been opened.
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryProgressSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSource for InMemoryProgressSource {
    fn open(&self) -> Result<ProgressTable, SourceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                reason: "marked unavailable".to_string(),
            });
        }

        let rows = self.rows.read().map_err(|_| SourceError::Unavailable {
            reason: "rows lock poisoned".to_string(),
        })?;
        Ok(ProgressTable::new(
            CURRENT,
            rows.current.clone(),
            REQUIRED,
            rows.required.clone(),
        ))
    }
}
