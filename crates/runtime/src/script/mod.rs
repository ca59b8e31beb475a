//! Contract for the embedded scripting VM.
//!
//! The VM is reduced to what progress reads need: find a controller object by
//! editor id, check that a script is attached to it, and read a named
//! property of that script instance.

mod memory;

pub use memory::InMemoryScriptVm;

/// Opaque handle to a VM-bound object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// A dynamically typed script value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    None,
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Array(Vec<ScriptValue>),
}

impl ScriptValue {
    /// Numeric view of the value. Integers are widened, nothing else converts.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ScriptValue::Float(value) => Some(*value),
            ScriptValue::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    pub fn float_array(values: &[f32]) -> Self {
        ScriptValue::Array(values.iter().copied().map(ScriptValue::Float).collect())
    }
}

pub trait ScriptVm: Send + Sync {
    /// Resolve the object handle of a controller quest by editor id.
    fn find_controller(&self, editor_id: &str) -> Option<ObjectHandle>;

    /// Whether a script of the given type is attached to the object.
    fn has_script(&self, handle: ObjectHandle, script: &str) -> bool;

    /// Read a property of the attached script instance.
    fn property(&self, handle: ObjectHandle, script: &str, name: &str) -> Option<ScriptValue>;
}
