//! Plugin configuration loader.

use std::path::Path;

use tracing::{info, warn};

use crate::config::PluginConfig;
use crate::loaders::{LoadResult, read_file};

/// Loader for plugin configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to [`PluginConfig::default`].
    pub fn load(path: &Path) -> LoadResult<PluginConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse config data from a TOML string.
    pub fn parse(content: &str) -> LoadResult<PluginConfig> {
        let config: PluginConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }

    /// Load config data, keeping the defaults when the file does not exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> LoadResult<PluginConfig> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(PluginConfig::default());
        }

        let config = Self::load(path)?;
        info!(
            package = %config.package_filename,
            entries = config.spell_indices.len(),
            "Loaded plugin config from {}",
            path.display()
        );
        Ok(config)
    }
}
