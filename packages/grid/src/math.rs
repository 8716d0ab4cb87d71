//! # Plot Grid Math
//!
//! Stateless transforms between world coordinates and grid cells.
//!
//! Each tile along an axis is `plot_size` ownable blocks followed by
//! `road_width` road blocks:
//!
//! ```text
//!  tile -1                  tile 0                  tile 1
//! |###### plot ######|road|###### plot ######|road|###### plot ######|road|
//! ^ anchor(-1)            ^ anchor(0) = 0         ^ anchor(1) = total
//! ```
//!
//! Negative coordinates use a mirrored formula (shift by one plot edge, then
//! divide rounding toward zero) so tile `-n` is laid out exactly like tile
//! `n` instead of being shifted by one block.

use crate::geometry::{BlockPos, Location, Region};
use crate::settings::{LevelSettings, LevelSettingsRegistry};
use crate::types::{Facing, Plot, PlotId};

/// Chunk edge length in blocks
pub const CHUNK_EDGE: i64 = 16;

/// Map a world position to the grid cell under it.
///
/// Coordinates are floored to block coordinates first. Returns `None` when
/// the block lies in a road margin on either axis, when a coordinate is not
/// finite, or when the tile falls outside the `i32` grid.
pub fn locate(x: f64, z: f64, settings: &LevelSettings) -> Option<PlotId> {
    if !x.is_finite() || !z.is_finite() {
        return None;
    }
    let plot_size = i64::from(settings.plot_size);
    let total = settings.total_size();

    let (tile_x, offset_x) = axis_tile(x.floor() as i64, plot_size, total)?;
    let (tile_z, offset_z) = axis_tile(z.floor() as i64, plot_size, total)?;

    if offset_x > plot_size - 1 || offset_z > plot_size - 1 {
        return None;
    }

    Some(PlotId::new(
        settings.name.clone(),
        i32::try_from(tile_x).ok()?,
        i32::try_from(tile_z).ok()?,
    ))
}

/// `(tile index, offset within tile)` along one axis
fn axis_tile(coord: i64, plot_size: i64, total: i64) -> Option<(i64, i64)> {
    if coord >= 0 {
        Some((coord / total, coord % total))
    } else {
        // `/` and `%` truncate toward zero, so this is ceil and a signed remainder.
        let shifted = coord.checked_sub(plot_size - 1)?;
        Some((shifted / total, (shifted % total).abs()))
    }
}

/// World position of a cell's minimum corner, at ground height
pub fn anchor(id: &PlotId, settings: &LevelSettings) -> BlockPos {
    let total = settings.total_size();
    BlockPos::new(
        total * i64::from(id.x),
        settings.ground_height,
        total * i64::from(id.z),
    )
}

/// Full-height box of a plot.
///
/// A single cell spans `plot_size` blocks per axis. A merged plot spans
/// `total_size * width - 1` blocks past its anchor on each axis, which
/// includes the trailing road strip.
pub fn bounding_box(plot: &Plot, settings: &LevelSettings) -> Region {
    let origin = anchor(plot.id(), settings);
    let (max_x, max_z) = match plot {
        Plot::Single(_) => {
            let plot_size = i64::from(settings.plot_size);
            (origin.x + plot_size - 1, origin.z + plot_size - 1)
        }
        Plot::Merged(merged) => {
            let total = settings.total_size();
            (
                origin.x + total * i64::from(merged.x_width) - 1,
                origin.z + total * i64::from(merged.z_width) - 1,
            )
        }
    };
    Region::new(
        BlockPos::new(origin.x, settings.min_y, origin.z),
        BlockPos::new(max_x, settings.max_y, max_z),
    )
}

/// Full-height box of the ownable area only, without the trailing road
pub fn footprint(plot: &Plot, settings: &LevelSettings) -> Region {
    let (x_width, z_width) = plot.widths();
    span_footprint(plot.id(), x_width, z_width, settings)
}

/// Footprint of one unmerged cell
pub fn cell_footprint(id: &PlotId, settings: &LevelSettings) -> Region {
    span_footprint(id, 1, 1, settings)
}

fn span_footprint(id: &PlotId, x_width: u32, z_width: u32, settings: &LevelSettings) -> Region {
    let origin = anchor(id, settings);
    let total = settings.total_size();
    let road = i64::from(settings.road_width);
    Region::new(
        BlockPos::new(origin.x, settings.min_y, origin.z),
        BlockPos::new(
            origin.x + total * i64::from(x_width) - road - 1,
            settings.max_y,
            origin.z + total * i64::from(z_width) - road - 1,
        ),
    )
}

/// First grid cell found among the four horizontal neighbours of `location`.
///
/// Returns `None` when the location's world has no plot settings. Only the
/// adjacent single cells are probed; a merged neighbour is recognised by the
/// cell touching `location`, not by its full edge.
pub fn bordering_plot(location: &Location, registry: &LevelSettingsRegistry) -> Option<PlotId> {
    let settings = registry.get(&location.level)?;
    let block = location.block();
    Facing::HORIZONTAL.iter().find_map(|facing| {
        let (dx, dz) = facing.offset();
        locate(
            (block.x + i64::from(dx)) as f64,
            (block.z + i64::from(dz)) as f64,
            &settings,
        )
    })
}

/// Chunk coordinates overlapped by the plot's bounding box
pub fn chunks(plot: &Plot, settings: &LevelSettings) -> Vec<(i64, i64)> {
    let bb = bounding_box(plot, settings);
    let shift = CHUNK_EDGE.trailing_zeros();
    let mut chunks = Vec::new();
    for cx in (bb.min.x >> shift)..=(bb.max.x >> shift) {
        for cz in (bb.min.z >> shift)..=(bb.max.z >> shift) {
            chunks.push((cx, cz));
        }
    }
    chunks
}
