//! Runtime configuration loaded from `plotworld.config.json`.
//!
//! A missing file means defaults. Each entry of `worlds` is registered under
//! its map key.

use plotworld_common::{PlotError, PlotResult};
use plotworld_grid::{LevelSettings, LevelSettingsRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "plotworld.config.json";

/// Plot engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Clear and merge through the bulk editor when one is installed
    #[serde(default)]
    pub fast_clearing: bool,

    /// Fill through the bulk editor when one is installed
    #[serde(default)]
    pub fast_filling: bool,

    /// Edit rate used when a caller passes 0
    #[serde(default = "default_max_blocks_per_tick")]
    pub max_blocks_per_tick: u32,

    /// Plot worlds keyed by world name
    #[serde(default)]
    pub worlds: BTreeMap<String, LevelSettings>,
}

fn default_max_blocks_per_tick() -> u32 {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_clearing: false,
            fast_filling: false,
            max_blocks_per_tick: default_max_blocks_per_tick(),
            worlds: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// does not exist
    pub fn load(dir: impl AsRef<Path>) -> PlotResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> PlotResult<Self> {
        serde_json::from_str(content).map_err(|e| PlotError::Config(e.to_string()))
    }

    /// Register every configured world, naming each after its map key.
    /// Returns how many were added.
    pub fn register_worlds(&self, registry: &LevelSettingsRegistry) -> PlotResult<usize> {
        for (name, settings) in &self.worlds {
            let mut settings = settings.clone();
            settings.name = name.clone();
            registry.add(settings)?;
        }
        Ok(self.worlds.len())
    }

    /// `rate`, or the configured default when `rate` is 0
    pub fn rate_or_default(&self, rate: u32) -> u32 {
        if rate == 0 {
            self.max_blocks_per_tick.max(1)
        } else {
            rate
        }
    }
}
