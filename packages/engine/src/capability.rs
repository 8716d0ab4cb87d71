//! # Host Capabilities
//!
//! Everything the engine needs from the outside world, expressed as traits so
//! hosts (and tests) can plug in their own implementations.
//!
//! ```text
//! PlotStore    async   persistence backend (required)
//! Economy      async   balance transfers (optional; buy/sell disabled without it)
//! WorldEditor  sync    bulk region edits (optional; enables the fast path)
//! WorldHost    sync    entities and single-block access (required)
//! Scheduler    sync    per-tick task runner (required)
//! ```

use async_trait::async_trait;
use plotworld_common::StoreResult;
use plotworld_grid::{BlockId, BlockPos, Location, MergedPlot, Plot, PlotId, Region};
use std::time::Duration;

/// Persistence backend.
///
/// Every call completes exactly once, with a value or a `StoreError`.
#[async_trait]
pub trait PlotStore: Send + Sync {
    /// Persist the record of `cell`, one of the cells covered by `plot`.
    ///
    /// A merged `plot` stores its anchor and widths with the cell so the
    /// union resolves again from any of its cells.
    async fn save(&self, cell: &PlotId, plot: &Plot) -> StoreResult<bool>;

    /// Plots owned by `owner`, optionally limited to one world
    async fn plots_by_owner(&self, owner: &str, level: Option<&str>) -> StoreResult<Vec<Plot>>;

    /// Nearest unclaimed cell to the origin, searching at most `limit` rings
    /// (0 = unbounded)
    async fn next_free_plot(&self, level: &str, limit: u32) -> StoreResult<Option<PlotId>>;

    /// Authoritative lookup of the plot covering a cell
    async fn resolve(&self, id: &PlotId) -> StoreResult<Option<Plot>>;

    /// Record `merged` as absorbing `absorbed`
    async fn merge(&self, merged: &MergedPlot, absorbed: &[Plot]) -> StoreResult<bool>;

    async fn delete(&self, plot: &Plot) -> StoreResult<bool>;

    /// Best-effort synchronous lookup; must not block
    fn cached_peek(&self, id: &PlotId) -> Option<Plot>;

    async fn shutdown(&self) -> StoreResult<()>;
}

/// Balance transfers for plot sales
#[async_trait]
pub trait Economy: Send + Sync {
    async fn debit(&self, player: &str, amount: u64) -> bool;

    async fn credit(&self, player: &str, amount: u64) -> bool;
}

/// Timing and volume of one bulk edit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditReport {
    pub elapsed: Duration,
    pub blocks_changed: u64,
}

impl std::ops::AddAssign for EditReport {
    fn add_assign(&mut self, other: Self) {
        self.elapsed += other.elapsed;
        self.blocks_changed += other.blocks_changed;
    }
}

/// Bulk world editing, applied synchronously
pub trait WorldEditor: Send + Sync {
    fn fill(&self, level: &str, region: &Region, block: &BlockId) -> EditReport;

    /// Copy `region` into the editor's clipboard
    fn copy(&self, level: &str, region: &Region) -> EditReport;

    /// Paste the clipboard with its minimum corner at `origin`
    fn paste(&self, level: &str, origin: BlockPos) -> EditReport;
}

pub type EntityId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Player { name: String },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub location: Location,
}

impl Entity {
    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player { .. })
    }
}

/// Live world access
pub trait WorldHost: Send + Sync {
    fn is_loaded(&self, level: &str) -> bool;

    fn entities(&self, level: &str) -> Vec<Entity>;

    fn teleport(&self, entity: EntityId, to: &Location) -> bool;

    fn despawn(&self, entity: EntityId);

    /// Returns whether the block changed
    fn set_block(&self, level: &str, pos: BlockPos, block: &BlockId) -> bool;

    fn set_biome(&self, level: &str, region: &Region, biome: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Pending,
    Done,
}

/// Unit of work advanced once per tick until it reports `Done`
pub trait TickTask: Send {
    fn tick(&mut self) -> TickStatus;
}

pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: Box<dyn TickTask>);
}
