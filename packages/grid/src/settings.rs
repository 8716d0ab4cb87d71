//! Per-world plot configuration.
//!
//! A `LevelSettings` value is created when a world loads and dropped when it
//! unloads. Values are never edited after registration; re-adding a world
//! replaces its settings wholesale.

use plotworld_common::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Block identifier understood by the host world, e.g. `minecraft:dirt`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_plot_size() -> u32 {
    32
}

fn default_road_width() -> u32 {
    7
}

fn default_ground_height() -> i64 {
    64
}

fn default_min_y() -> i64 {
    0
}

fn default_max_y() -> i64 {
    255
}

fn default_road_block() -> BlockId {
    BlockId::new("minecraft:oak_planks")
}

fn default_wall_block() -> BlockId {
    BlockId::new("minecraft:stone_slab")
}

fn default_floor_block() -> BlockId {
    BlockId::new("minecraft:grass_block")
}

fn default_fill_block() -> BlockId {
    BlockId::new("minecraft:dirt")
}

fn default_bottom_block() -> BlockId {
    BlockId::new("minecraft:bedrock")
}

/// Plot layout constants of one world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSettings {
    /// Filled from the config map key when loaded from a file
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_plot_size")]
    pub plot_size: u32,

    #[serde(default = "default_road_width")]
    pub road_width: u32,

    /// Y of the plot floor layer
    #[serde(default = "default_ground_height")]
    pub ground_height: i64,

    /// Lowest buildable Y of the world
    #[serde(default = "default_min_y")]
    pub min_y: i64,

    /// Highest buildable Y of the world
    #[serde(default = "default_max_y")]
    pub max_y: i64,

    #[serde(default = "default_road_block")]
    pub road_block: BlockId,

    #[serde(default = "default_wall_block")]
    pub wall_block: BlockId,

    #[serde(default = "default_floor_block")]
    pub floor_block: BlockId,

    #[serde(default = "default_fill_block")]
    pub fill_block: BlockId,

    #[serde(default = "default_bottom_block")]
    pub bottom_block: BlockId,
}

impl LevelSettings {
    /// Settings with the default layout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plot_size: default_plot_size(),
            road_width: default_road_width(),
            ground_height: default_ground_height(),
            min_y: default_min_y(),
            max_y: default_max_y(),
            road_block: default_road_block(),
            wall_block: default_wall_block(),
            floor_block: default_floor_block(),
            fill_block: default_fill_block(),
            bottom_block: default_bottom_block(),
        }
    }

    pub fn with_plot_size(mut self, plot_size: u32) -> Self {
        self.plot_size = plot_size;
        self
    }

    pub fn with_road_width(mut self, road_width: u32) -> Self {
        self.road_width = road_width;
        self
    }

    pub fn with_ground_height(mut self, ground_height: i64) -> Self {
        self.ground_height = ground_height;
        self
    }

    pub fn with_height_range(mut self, min_y: i64, max_y: i64) -> Self {
        self.min_y = min_y;
        self.max_y = max_y;
        self
    }

    /// Plot edge plus one road margin
    pub fn total_size(&self) -> i64 {
        i64::from(self.plot_size) + i64::from(self.road_width)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.name.is_empty() {
            return Err(SettingsError::EmptyLevelName);
        }
        if self.plot_size < 1 {
            return Err(SettingsError::PlotSizeTooSmall(self.plot_size));
        }
        // Fill needs at least one layer between bottom and floor.
        if self.min_y >= self.ground_height || self.ground_height >= self.max_y {
            return Err(SettingsError::InvalidHeightRange {
                min_y: self.min_y,
                max_y: self.max_y,
                ground_height: self.ground_height,
            });
        }
        for (field, block) in [
            ("roadBlock", &self.road_block),
            ("wallBlock", &self.wall_block),
            ("floorBlock", &self.floor_block),
            ("fillBlock", &self.fill_block),
            ("bottomBlock", &self.bottom_block),
        ] {
            if block.is_empty() {
                return Err(SettingsError::EmptyBlock(field));
            }
        }
        Ok(())
    }
}

/// Process-wide map from world name to its settings.
///
/// Guarded internally so it can be shared across tasks behind an `Arc`.
#[derive(Debug, Default)]
pub struct LevelSettingsRegistry {
    levels: RwLock<HashMap<String, Arc<LevelSettings>>>,
}

impl LevelSettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or wholesale replace) the settings of a world
    pub fn add(&self, settings: LevelSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let mut levels = self.levels.write().unwrap_or_else(PoisonError::into_inner);
        levels.insert(settings.name.clone(), Arc::new(settings));
        Ok(())
    }

    /// `None` is a normal outcome: the world has no plots.
    pub fn get(&self, level: &str) -> Option<Arc<LevelSettings>> {
        let levels = self.levels.read().unwrap_or_else(PoisonError::into_inner);
        levels.get(level).cloned()
    }

    /// Returns whether the world was registered
    pub fn remove(&self, level: &str) -> bool {
        let mut levels = self.levels.write().unwrap_or_else(PoisonError::into_inner);
        levels.remove(level).is_some()
    }

    pub fn contains(&self, level: &str) -> bool {
        self.get(level).is_some()
    }

    /// Registered world names, sorted
    pub fn names(&self) -> Vec<String> {
        let levels = self.levels.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = levels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.levels.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
