use std::sync::Arc;

use spell_content::{ProgressSourceConfig, SpellIndex};
use tracing::trace;

use crate::api::SourceError;
use crate::script::{ScriptValue, ScriptVm};

/// Opens the pair of experience arrays for one batch.
pub trait ProgressSource: Send + Sync {
    fn open(&self) -> Result<ProgressTable, SourceError>;
}

/// Snapshot of the "current" and "required" experience arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTable {
    current_name: String,
    current: Vec<ScriptValue>,
    required_name: String,
    required: Vec<ScriptValue>,
}

impl ProgressTable {
    pub fn new(
        current_name: impl Into<String>,
        current: Vec<ScriptValue>,
        required_name: impl Into<String>,
        required: Vec<ScriptValue>,
    ) -> Self {
        Self {
            current_name: current_name.into(),
            current,
            required_name: required_name.into(),
            required,
        }
    }

    /// Read `(current_xp, required_xp)` at `index`.
    ///
    /// Bounds are checked against both arrays before any cell is read.
    pub fn read_row(&self, index: SpellIndex) -> Result<(f32, f32), SourceError> {
        let index = index.as_usize();
        check_bounds(&self.current_name, &self.current, index)?;
        check_bounds(&self.required_name, &self.required, index)?;

        let current = numeric_cell(&self.current_name, &self.current, index)?;
        let required = numeric_cell(&self.required_name, &self.required, index)?;
        Ok((current, required))
    }

    pub fn len(&self) -> usize {
        self.current.len().min(self.required.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_bounds(name: &str, cells: &[ScriptValue], index: usize) -> Result<(), SourceError> {
    if index >= cells.len() {
        return Err(SourceError::IndexOutOfBounds {
            name: name.to_string(),
            index,
            len: cells.len(),
        });
    }
    Ok(())
}

fn numeric_cell(name: &str, cells: &[ScriptValue], index: usize) -> Result<f32, SourceError> {
    cells[index]
        .as_number()
        .ok_or_else(|| SourceError::WrongType {
            name: name.to_string(),
            index,
        })
}

/// Progress source backed by a script attached to a controller quest.
pub struct ScriptProgressSource<V: ScriptVm + ?Sized> {
    vm: Arc<V>,
    config: ProgressSourceConfig,
}

impl<V: ScriptVm + ?Sized> ScriptProgressSource<V> {
    pub fn new(vm: Arc<V>, config: ProgressSourceConfig) -> Self {
        Self { vm, config }
    }

    fn array_property(
        &self,
        handle: crate::script::ObjectHandle,
        name: &str,
    ) -> Result<Vec<ScriptValue>, SourceError> {
        match self.vm.property(handle, &self.config.script_name, name) {
            Some(ScriptValue::Array(cells)) => Ok(cells),
            Some(_) => Err(SourceError::NotAnArray {
                name: name.to_string(),
            }),
            None => Err(SourceError::PropertyMissing {
                name: name.to_string(),
            }),
        }
    }
}

impl<V: ScriptVm + ?Sized> ProgressSource for ScriptProgressSource<V> {
    fn open(&self) -> Result<ProgressTable, SourceError> {
        let config = &self.config;
        let handle = self
            .vm
            .find_controller(&config.controller_editor_id)
            .ok_or_else(|| SourceError::ControllerMissing {
                editor_id: config.controller_editor_id.clone(),
            })?;

        if !self.vm.has_script(handle, &config.script_name) {
            return Err(SourceError::ScriptMissing {
                editor_id: config.controller_editor_id.clone(),
                script: config.script_name.clone(),
            });
        }

        let current = self.array_property(handle, &config.current_xp_property)?;
        let required = self.array_property(handle, &config.required_xp_property)?;
        trace!(
            current_len = current.len(),
            required_len = required.len(),
            "opened progress arrays on {}",
            config.controller_editor_id
        );

        Ok(ProgressTable::new(
            config.current_xp_property.clone(),
            current,
            config.required_xp_property.clone(),
            required,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::InMemoryScriptVm;

    const QUEST: &str = "vMCM";
    const SCRIPT: &str = "vMCMscript";

    fn vm_with_arrays(current: &[f32], required: &[f32]) -> Arc<InMemoryScriptVm> {
        let vm = InMemoryScriptVm::new();
        vm.set_property(QUEST, SCRIPT, "fSPXP", ScriptValue::float_array(current));
        vm.set_property(QUEST, SCRIPT, "fXPreq", ScriptValue::float_array(required));
        Arc::new(vm)
    }

    fn source(vm: Arc<InMemoryScriptVm>) -> ScriptProgressSource<InMemoryScriptVm> {
        ScriptProgressSource::new(vm, ProgressSourceConfig::default())
    }

    #[test]
    fn test_reads_row_from_script_arrays() {
        let table = source(vm_with_arrays(&[5.0, 12.5], &[50.0, 25.0]))
            .open()
            .unwrap();

        assert_eq!(table.read_row(SpellIndex(1)).unwrap(), (12.5, 25.0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_controller() {
        let vm = Arc::new(InMemoryScriptVm::new());
        assert_eq!(
            source(vm).open(),
            Err(SourceError::ControllerMissing {
                editor_id: QUEST.to_string()
            })
        );
    }

    #[test]
    fn test_missing_script() {
        let vm = InMemoryScriptVm::new();
        vm.attach_script(QUEST, "SomethingElse");
        assert!(matches!(
            source(Arc::new(vm)).open(),
            Err(SourceError::ScriptMissing { .. })
        ));
    }

    #[test]
    fn test_missing_property() {
        let vm = vm_with_arrays(&[1.0], &[2.0]);
        vm.remove_property(QUEST, SCRIPT, "fXPreq");
        assert_eq!(
            source(vm).open(),
            Err(SourceError::PropertyMissing {
                name: "fXPreq".to_string()
            })
        );
    }

    #[test]
    fn test_property_that_is_not_an_array() {
        let vm = vm_with_arrays(&[1.0], &[2.0]);
        vm.set_property(QUEST, SCRIPT, "fSPXP", ScriptValue::Float(1.0));
        assert_eq!(
            source(vm).open(),
            Err(SourceError::NotAnArray {
                name: "fSPXP".to_string()
            })
        );
    }

    #[test]
    fn test_index_out_of_bounds_on_shorter_array() {
        let table = source(vm_with_arrays(&[1.0, 2.0, 3.0], &[10.0]))
            .open()
            .unwrap();

        assert_eq!(
            table.read_row(SpellIndex(2)),
            Err(SourceError::IndexOutOfBounds {
                name: "fXPreq".to_string(),
                index: 2,
                len: 1,
            })
        );
    }

    #[test]
    fn test_empty_arrays_are_out_of_bounds() {
        let table = source(vm_with_arrays(&[], &[])).open().unwrap();
        assert!(table.is_empty());
        assert!(matches!(
            table.read_row(SpellIndex(0)),
            Err(SourceError::IndexOutOfBounds { len: 0, .. })
        ));
    }

    #[test]
    fn test_non_numeric_cell_is_wrong_type() {
        let vm = vm_with_arrays(&[1.0], &[2.0]);
        vm.set_property(
            QUEST,
            SCRIPT,
            "fSPXP",
            ScriptValue::Array(vec![ScriptValue::String("many".to_string())]),
        );
        let table = source(vm).open().unwrap();

        assert_eq!(
            table.read_row(SpellIndex(0)),
            Err(SourceError::WrongType {
                name: "fSPXP".to_string(),
                index: 0,
            })
        );
    }

    #[test]
    fn test_integer_cells_are_widened() {
        let table = ProgressTable::new(
            "cur",
            vec![ScriptValue::Int(3)],
            "req",
            vec![ScriptValue::Float(6.0)],
        );
        assert_eq!(table.read_row(SpellIndex(0)).unwrap(), (3.0, 6.0));
    }
}
