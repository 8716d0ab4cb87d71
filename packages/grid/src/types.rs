//! # Plot Values
//!
//! Plots are immutable value objects. Every change builds a new value
//! (clone, then edit the clone) so the original can be handed to hooks
//! next to the proposed one.
//!
//! ```text
//! PlotId ──────────── one grid cell (a "base plot": identity only)
//!   │
//!   ├─ SinglePlot ─── PlotId + PlotInfo
//!   │
//!   └─ MergedPlot ─── PlotId (anchor) + PlotInfo + x_width × z_width cells
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard entry matching every player in helper/denied lists
pub const WILDCARD: &str = "*";

/// Identity of one grid cell, independent of merge state
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlotId {
    pub level: String,
    pub x: i32,
    pub z: i32,
}

/// An unresolved plot reference carries nothing beyond its identity.
pub type BasePlot = PlotId;

impl PlotId {
    pub fn new(level: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            level: level.into(),
            x,
            z,
        }
    }

    /// The cell `steps` cells away in `facing`, stopping at the grid edge.
    pub fn side(&self, facing: Facing, steps: i32) -> Self {
        let (dx, dz) = facing.offset();
        Self {
            level: self.level.clone(),
            x: self.x.saturating_add(dx.saturating_mul(steps)),
            z: self.z.saturating_add(dz.saturating_mul(steps)),
        }
    }
}

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{};{}", self.level, self.x, self.z)
    }
}

/// Horizontal axis of the plot grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

/// Horizontal direction on the grid.
///
/// North is −Z, East is +X, South is +Z, West is −X.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const HORIZONTAL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn axis(self) -> Axis {
        match self {
            Facing::East | Facing::West => Axis::X,
            Facing::North | Facing::South => Axis::Z,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Facing::East | Facing::South)
    }

    /// Unit step `(dx, dz)` in grid cells
    pub fn offset(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    /// Rotate 90° around the vertical axis
    pub fn rotate_y(self, clockwise: bool) -> Self {
        match (self, clockwise) {
            (Facing::North, true) | (Facing::South, false) => Facing::East,
            (Facing::East, true) | (Facing::West, false) => Facing::South,
            (Facing::South, true) | (Facing::North, false) => Facing::West,
            (Facing::West, true) | (Facing::East, false) => Facing::North,
        }
    }

    pub fn opposite(self) -> Self {
        self.rotate_y(true).rotate_y(true)
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
        };
        f.write_str(name)
    }
}

/// Ownership and metadata shared by every cell of a plot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlotInfo {
    /// Empty when unclaimed
    pub owner: String,
    pub name: String,
    pub helpers: Vec<String>,
    pub denied: Vec<String>,
    pub biome: String,
    pub pvp: bool,
    /// Asking price; 0 means not for sale
    pub price: u64,
    /// Unix millis of the last claim
    pub claimed_at: Option<i64>,
}

impl Default for PlotInfo {
    fn default() -> Self {
        Self {
            owner: String::new(),
            name: String::new(),
            helpers: Vec::new(),
            denied: Vec::new(),
            biome: "PLAINS".to_string(),
            pvp: true,
            price: 0,
            claimed_at: None,
        }
    }
}

impl PlotInfo {
    pub fn is_claimed(&self) -> bool {
        !self.owner.is_empty()
    }

    pub fn is_helper(&self, player: &str) -> bool {
        self.helpers.iter().any(|h| h == player || h == WILDCARD)
    }

    /// Returns whether the helper list changed. A new helper is no longer denied.
    pub fn add_helper(&mut self, player: &str) -> bool {
        if self.helpers.iter().any(|h| h == player) {
            return false;
        }
        self.denied.retain(|d| d != player);
        self.helpers.push(player.to_string());
        true
    }

    pub fn remove_helper(&mut self, player: &str) -> bool {
        let before = self.helpers.len();
        self.helpers.retain(|h| h != player);
        self.helpers.len() != before
    }

    pub fn is_denied(&self, player: &str) -> bool {
        self.denied.iter().any(|d| d == player || d == WILDCARD)
    }

    /// Returns whether the denied list changed. A denied player is no longer a helper.
    pub fn deny_player(&mut self, player: &str) -> bool {
        if self.denied.iter().any(|d| d == player) {
            return false;
        }
        self.helpers.retain(|h| h != player);
        self.denied.push(player.to_string());
        true
    }

    pub fn undeny_player(&mut self, player: &str) -> bool {
        let before = self.denied.len();
        self.denied.retain(|d| d != player);
        self.denied.len() != before
    }
}

/// One unmerged cell with its metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePlot {
    pub id: PlotId,
    pub info: PlotInfo,
}

impl SinglePlot {
    pub fn new(id: PlotId, info: PlotInfo) -> Self {
        Self { id, info }
    }

    /// Fresh, unowned cell
    pub fn unclaimed(id: PlotId) -> Self {
        Self::new(id, PlotInfo::default())
    }
}

/// Rectangular union of cells `[x, x + x_width) × [z, z + z_width)` anchored at `id`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedPlot {
    pub id: PlotId,
    pub info: PlotInfo,
    pub x_width: u32,
    pub z_width: u32,
}

impl MergedPlot {
    /// Widths are clamped to at least 1.
    pub fn from_single(single: SinglePlot, x_width: u32, z_width: u32) -> Self {
        Self {
            id: single.id,
            info: single.info,
            x_width: x_width.max(1),
            z_width: z_width.max(1),
        }
    }

    pub fn covers(&self, cell: &PlotId) -> bool {
        cell.level == self.id.level
            && i64::from(cell.x) >= i64::from(self.id.x)
            && i64::from(cell.x) < i64::from(self.id.x) + i64::from(self.x_width)
            && i64::from(cell.z) >= i64::from(self.id.z)
            && i64::from(cell.z) < i64::from(self.id.z) + i64::from(self.z_width)
    }

    /// Covered cells, x-major
    pub fn cells(&self) -> Vec<PlotId> {
        let mut cells = Vec::with_capacity((self.x_width * self.z_width) as usize);
        for dx in 0..self.x_width as i32 {
            for dz in 0..self.z_width as i32 {
                cells.push(PlotId::new(
                    self.id.level.clone(),
                    self.id.x + dx,
                    self.id.z + dz,
                ));
            }
        }
        cells
    }
}

/// A resolved plot: one cell or a merged union
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Plot {
    Single(SinglePlot),
    Merged(MergedPlot),
}

impl Plot {
    pub fn id(&self) -> &PlotId {
        match self {
            Plot::Single(p) => &p.id,
            Plot::Merged(p) => &p.id,
        }
    }

    pub fn info(&self) -> &PlotInfo {
        match self {
            Plot::Single(p) => &p.info,
            Plot::Merged(p) => &p.info,
        }
    }

    /// Only meant for editing a freshly cloned value.
    pub fn info_mut(&mut self) -> &mut PlotInfo {
        match self {
            Plot::Single(p) => &mut p.info,
            Plot::Merged(p) => &mut p.info,
        }
    }

    pub fn level(&self) -> &str {
        &self.id().level
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Plot::Merged(_))
    }

    /// `(x_width, z_width)`; `(1, 1)` for a single cell
    pub fn widths(&self) -> (u32, u32) {
        match self {
            Plot::Single(_) => (1, 1),
            Plot::Merged(p) => (p.x_width, p.z_width),
        }
    }

    pub fn cells(&self) -> Vec<PlotId> {
        match self {
            Plot::Single(p) => vec![p.id.clone()],
            Plot::Merged(p) => p.cells(),
        }
    }

    pub fn covers(&self, cell: &PlotId) -> bool {
        match self {
            Plot::Single(p) => &p.id == cell,
            Plot::Merged(p) => p.covers(cell),
        }
    }
}

impl From<SinglePlot> for Plot {
    fn from(plot: SinglePlot) -> Self {
        Plot::Single(plot)
    }
}

impl From<MergedPlot> for Plot {
    fn from(plot: MergedPlot) -> Self {
        Plot::Merged(plot)
    }
}
