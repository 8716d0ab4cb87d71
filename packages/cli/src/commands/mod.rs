pub mod bounds;
pub mod locate;
pub mod worlds;

pub use bounds::{bounds, BoundsArgs};
pub use locate::{locate, LocateArgs};
pub use worlds::worlds;

use anyhow::{anyhow, Result};
use plotworld_grid::{LevelSettings, LevelSettingsRegistry};
use std::sync::Arc;

fn world_settings(registry: &LevelSettingsRegistry, world: &str) -> Result<Arc<LevelSettings>> {
    registry.get(world).ok_or_else(|| {
        let known = registry.names();
        if known.is_empty() {
            anyhow!("Unknown plot world: {} (no worlds configured)", world)
        } else {
            anyhow!("Unknown plot world: {} (known: {})", world, known.join(", "))
        }
    })
}
