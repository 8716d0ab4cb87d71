//! Entity placement onto plots.

use crate::capability::EntityId;
use crate::hooks::{Cancellable, TeleportEvent};
use crate::manager::PlotManager;
use plotworld_grid::{footprint, LevelSettings, Location, Plot};

/// Where an entity lands on `plot`: half a block above the floor, either at
/// the footprint centre or centred on its north edge, one block inside.
pub fn stand_point(plot: &Plot, centered: bool, settings: &LevelSettings) -> Location {
    let fp = footprint(plot, settings);
    let y = settings.ground_height as f64 + 1.5;
    let center_x = (fp.min.x + fp.max.x + 1) as f64 / 2.0;
    let z = if centered {
        (fp.min.z + fp.max.z + 1) as f64 / 2.0
    } else {
        fp.min.z as f64 + 0.5
    };
    Location::new(plot.level(), center_x, y, z)
}

impl PlotManager {
    /// Returns false when vetoed, when the plot's world has no settings, or
    /// when the host refuses the move.
    pub fn teleport_to(&self, entity: EntityId, plot: &Plot, centered: bool) -> bool {
        let mut event = TeleportEvent::new(plot.clone(), entity, centered);
        self.hooks.teleport.dispatch(&mut event);
        if event.is_cancelled() {
            return false;
        }
        let Some(settings) = self.registry.get(event.plot.level()) else {
            return false;
        };
        let target = stand_point(&event.plot, event.centered, &settings);
        self.host.teleport(entity, &target)
    }
}
