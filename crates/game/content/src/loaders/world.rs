//! World fixture loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::world::WorldData;

/// Loader for world fixtures from RON files.
pub struct WorldLoader;

impl WorldLoader {
    /// Load a world fixture from a RON file.
    pub fn load(path: &Path) -> LoadResult<WorldData> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<WorldData> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse world RON: {}", e))
    }
}
