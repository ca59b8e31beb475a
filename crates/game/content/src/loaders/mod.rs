//! Content loaders for reading plugin data from files.
//!
//! Configuration is TOML, world fixtures are RON.

pub mod config;
pub mod world;

pub use config::ConfigLoader;
pub use world::WorldLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
