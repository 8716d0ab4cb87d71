//! World-space geometry: block positions, entity locations and inclusive
//! block regions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer block position in world space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Continuous position inside a named world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub level: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(level: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            level: level.into(),
            x,
            y,
            z,
        }
    }

    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }
}

/// Inclusive axis-aligned block region.
///
/// Iteration order is x fastest, then z, then y, so a cursor into the
/// region is just a block index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Region {
    /// Corners may be given in any order.
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn size_x(&self) -> u64 {
        (self.max.x - self.min.x + 1) as u64
    }

    pub fn size_y(&self) -> u64 {
        (self.max.y - self.min.y + 1) as u64
    }

    pub fn size_z(&self) -> u64 {
        (self.max.z - self.min.z + 1) as u64
    }

    /// Number of blocks
    pub fn volume(&self) -> u64 {
        self.size_x() * self.size_y() * self.size_z()
    }

    /// Same column range with a new vertical span
    pub fn with_y(&self, min_y: i64, max_y: i64) -> Self {
        Self::new(
            BlockPos::new(self.min.x, min_y, self.min.z),
            BlockPos::new(self.max.x, max_y, self.max.z),
        )
    }

    /// Grow (or shrink, for negative `by`) horizontally on every side
    pub fn expanded_xz(&self, by: i64) -> Self {
        Self::new(
            BlockPos::new(self.min.x - by, self.min.y, self.min.z - by),
            BlockPos::new(self.max.x + by, self.max.y, self.max.z + by),
        )
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.contains_xz(pos.x, pos.z) && pos.y >= self.min.y && pos.y <= self.max.y
    }

    pub fn contains_xz(&self, x: i64, z: i64) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }

    /// Horizontal containment of a continuous location
    pub fn contains_location_xz(&self, location: &Location) -> bool {
        let block = location.block();
        self.contains_xz(block.x, block.z)
    }

    /// The `index`-th block in iteration order, if inside the region
    pub fn nth_block(&self, index: u64) -> Option<BlockPos> {
        if index >= self.volume() {
            return None;
        }
        let layer = self.size_x() * self.size_z();
        let y = index / layer;
        let rest = index % layer;
        let z = rest / self.size_x();
        let x = rest % self.size_x();
        Some(BlockPos::new(
            self.min.x + x as i64,
            self.min.y + y as i64,
            self.min.z + z as i64,
        ))
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (0..self.volume()).filter_map(move |i| self.nth_block(i))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}
