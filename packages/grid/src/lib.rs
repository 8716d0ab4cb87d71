//! # Plotworld Grid
//!
//! Value types and stateless geometry for plots tiled over an unbounded
//! 2-D grid.
//!
//! ```rust,ignore
//! use plotworld_grid::{locate, LevelSettings};
//!
//! let settings = LevelSettings::new("world").with_plot_size(32).with_road_width(7);
//! assert_eq!(locate(39.0, 0.0, &settings).map(|id| id.x), Some(1));
//! assert_eq!(locate(32.0, 0.0, &settings), None); // road
//! ```

mod geometry;
mod math;
mod settings;
mod types;

pub use geometry::{BlockPos, Location, Region};
pub use math::{
    anchor, bordering_plot, bounding_box, cell_footprint, chunks, footprint, locate, CHUNK_EDGE,
};
pub use settings::{BlockId, LevelSettings, LevelSettingsRegistry};
pub use types::{Axis, BasePlot, Facing, MergedPlot, Plot, PlotId, PlotInfo, SinglePlot, WILDCARD};
