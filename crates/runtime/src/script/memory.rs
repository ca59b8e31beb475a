//! In-memory ScriptVm implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use spell_content::ScriptState;

use super::{ObjectHandle, ScriptValue, ScriptVm};

type Properties = HashMap<String, ScriptValue>;

struct Controller {
    handle: ObjectHandle,
    scripts: HashMap<String, Properties>,
}

/// In-memory implementation of [`ScriptVm`].
///
/// Controllers are registered by editor id; properties can be rewritten at
/// any time to simulate the content package's script gaining experience.
pub struct InMemoryScriptVm {
    controllers: RwLock<HashMap<String, Controller>>,
    next_handle: AtomicU64,
}

impl InMemoryScriptVm {
    pub fn new() -> Self {
        Self {
            controllers: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Build a VM from the script states of a world fixture.
    pub fn from_scripts(scripts: &[ScriptState]) -> Self {
        let vm = Self::new();
        for state in scripts {
            vm.attach_script(&state.controller_editor_id, &state.script_name);
            for (name, values) in &state.float_arrays {
                vm.set_property(
                    &state.controller_editor_id,
                    &state.script_name,
                    name,
                    ScriptValue::float_array(values),
                );
            }
        }
        vm
    }

    /// Attach a script with no properties, registering the controller if needed.
    pub fn attach_script(&self, editor_id: &str, script: &str) {
        let Ok(mut controllers) = self.controllers.write() else {
            return;
        };
        controllers
            .entry(editor_id.to_string())
            .or_insert_with(|| Controller {
                handle: ObjectHandle(self.next_handle.fetch_add(1, Ordering::Relaxed)),
                scripts: HashMap::new(),
            })
            .scripts
            .entry(script.to_string())
            .or_default();
    }

    /// Set a property, attaching the script first if necessary.
    pub fn set_property(&self, editor_id: &str, script: &str, name: &str, value: ScriptValue) {
        self.attach_script(editor_id, script);
        if let Ok(mut controllers) = self.controllers.write()
            && let Some(properties) = controllers
                .get_mut(editor_id)
                .and_then(|controller| controller.scripts.get_mut(script))
        {
            properties.insert(name.to_string(), value);
        }
    }

    /// Overwrite one cell of an array property, growing it with zeros.
    pub fn set_float(&self, editor_id: &str, script: &str, name: &str, index: usize, value: f32) {
        self.attach_script(editor_id, script);
        let Ok(mut controllers) = self.controllers.write() else {
            return;
        };
        let Some(properties) = controllers
            .get_mut(editor_id)
            .and_then(|controller| controller.scripts.get_mut(script))
        else {
            return;
        };

        let entry = properties
            .entry(name.to_string())
            .or_insert_with(|| ScriptValue::Array(Vec::new()));
        if let ScriptValue::Array(cells) = entry {
            if cells.len() <= index {
                cells.resize(index + 1, ScriptValue::Float(0.0));
            }
            cells[index] = ScriptValue::Float(value);
        }
    }

    pub fn remove_property(&self, editor_id: &str, script: &str, name: &str) {
        if let Ok(mut controllers) = self.controllers.write()
            && let Some(properties) = controllers
                .get_mut(editor_id)
                .and_then(|controller| controller.scripts.get_mut(script))
        {
            properties.remove(name);
        }
    }

    /// Remove a controller and every script attached to it.
    pub fn remove_controller(&self, editor_id: &str) {
        if let Ok(mut controllers) = self.controllers.write() {
            controllers.remove(editor_id);
        }
    }
}

impl Default for InMemoryScriptVm {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptVm for InMemoryScriptVm {
    fn find_controller(&self, editor_id: &str) -> Option<ObjectHandle> {
        let controllers = self.controllers.read().ok()?;
        controllers.get(editor_id).map(|controller| controller.handle)
    }

    fn has_script(&self, handle: ObjectHandle, script: &str) -> bool {
        self.controllers.read().is_ok_and(|controllers| {
            controllers
                .values()
                .any(|controller| controller.handle == handle && controller.scripts.contains_key(script))
        })
    }

    fn property(&self, handle: ObjectHandle, script: &str, name: &str) -> Option<ScriptValue> {
        let controllers = self.controllers.read().ok()?;
        controllers
            .values()
            .find(|controller| controller.handle == handle)?
            .scripts
            .get(script)?
            .get(name)
            .cloned()
    }
}
