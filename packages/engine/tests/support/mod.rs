//! In-memory doubles shared by the engine integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use plotworld_common::{StoreError, StoreResult};
use plotworld_engine::{
    EditReport, EngineConfig, Entity, EntityId, EntityKind, Economy, MemoryPlotStore, PlotManager,
    PlotStore, TickScheduler, WorldEditor, WorldHost,
};
use plotworld_grid::{
    BlockId, BlockPos, LevelSettings, LevelSettingsRegistry, Location, MergedPlot, Plot, PlotId,
    PlotInfo, Region, SinglePlot,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

pub const LEVEL: &str = "plots";

/// Small layout so voxel edits stay cheap: tiles of 4 + 2, ground at 3
pub fn settings() -> LevelSettings {
    LevelSettings::new(LEVEL)
        .with_plot_size(4)
        .with_road_width(2)
        .with_ground_height(3)
        .with_height_range(0, 6)
}

// ---------------------------------------------------------------------------
// World

/// Sparse block world; absent blocks are air
#[derive(Default)]
pub struct VoxelWorld {
    blocks: Mutex<BTreeMap<BlockPos, BlockId>>,
    entities: Mutex<Vec<Entity>>,
    clipboard: Mutex<Vec<(BlockPos, Option<BlockId>)>>,
    pub teleports: Mutex<Vec<(EntityId, Location)>>,
    pub despawned: Mutex<Vec<EntityId>>,
    pub biomes: Mutex<Vec<(Region, String)>>,
    pub bulk_fills: AtomicUsize,
}

impl VoxelWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, pos: BlockPos) -> BlockId {
        self.blocks
            .lock()
            .unwrap()
            .get(&pos)
            .cloned()
            .unwrap_or_else(BlockId::air)
    }

    pub fn put(&self, pos: BlockPos, block: &str) {
        self.blocks.lock().unwrap().insert(pos, BlockId::new(block));
    }

    pub fn snapshot(&self) -> BTreeMap<BlockPos, BlockId> {
        self.blocks.lock().unwrap().clone()
    }

    pub fn spawn(&self, id: EntityId, kind: EntityKind, x: f64, z: f64) {
        self.entities.lock().unwrap().push(Entity {
            id,
            kind,
            location: Location::new(LEVEL, x, 4.0, z),
        });
    }

    fn write(&self, pos: BlockPos, block: &BlockId) -> bool {
        let mut blocks = self.blocks.lock().unwrap();
        let previous = if *block == BlockId::air() {
            blocks.remove(&pos)
        } else {
            blocks.insert(pos, block.clone())
        };
        previous.unwrap_or_else(BlockId::air) != *block
    }
}

impl WorldHost for VoxelWorld {
    fn is_loaded(&self, level: &str) -> bool {
        level == LEVEL
    }

    fn entities(&self, level: &str) -> Vec<Entity> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .filter(|entity| entity.location.level == level)
            .cloned()
            .collect()
    }

    fn teleport(&self, entity: EntityId, to: &Location) -> bool {
        self.teleports.lock().unwrap().push((entity, to.clone()));
        true
    }

    fn despawn(&self, entity: EntityId) {
        self.entities.lock().unwrap().retain(|e| e.id != entity);
        self.despawned.lock().unwrap().push(entity);
    }

    fn set_block(&self, _level: &str, pos: BlockPos, block: &BlockId) -> bool {
        self.write(pos, block)
    }

    fn set_biome(&self, _level: &str, region: &Region, biome: &str) {
        self.biomes.lock().unwrap().push((*region, biome.to_string()));
    }
}

impl WorldEditor for VoxelWorld {
    fn fill(&self, _level: &str, region: &Region, block: &BlockId) -> EditReport {
        let started = Instant::now();
        self.bulk_fills.fetch_add(1, Ordering::SeqCst);
        let changed = region.blocks().filter(|pos| self.write(*pos, block)).count();
        EditReport {
            elapsed: started.elapsed(),
            blocks_changed: changed as u64,
        }
    }

    fn copy(&self, _level: &str, region: &Region) -> EditReport {
        let started = Instant::now();
        let blocks = self.blocks.lock().unwrap();
        let copied: Vec<(BlockPos, Option<BlockId>)> = region
            .blocks()
            .map(|pos| {
                let offset = BlockPos::new(
                    pos.x - region.min.x,
                    pos.y - region.min.y,
                    pos.z - region.min.z,
                );
                (offset, blocks.get(&pos).cloned())
            })
            .collect();
        drop(blocks);
        let count = copied.len() as u64;
        *self.clipboard.lock().unwrap() = copied;
        EditReport {
            elapsed: started.elapsed(),
            blocks_changed: count,
        }
    }

    fn paste(&self, _level: &str, origin: BlockPos) -> EditReport {
        let started = Instant::now();
        let clipboard = self.clipboard.lock().unwrap().clone();
        let mut changed = 0;
        for (offset, block) in clipboard {
            let pos = BlockPos::new(origin.x + offset.x, origin.y + offset.y, origin.z + offset.z);
            if self.write(pos, &block.unwrap_or_else(BlockId::air)) {
                changed += 1;
            }
        }
        EditReport {
            elapsed: started.elapsed(),
            blocks_changed: changed,
        }
    }
}

// ---------------------------------------------------------------------------
// Store

/// `MemoryPlotStore` that counts calls and fails on demand
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryPlotStore,
    pub saves: AtomicUsize,
    pub resolves: AtomicUsize,
    pub resolves_done: AtomicUsize,
    pub merges: AtomicUsize,
    pub deletes: AtomicUsize,
    pub saved_cells: Mutex<Vec<PlotId>>,
    rejected_saves: Mutex<HashSet<PlotId>>,
    failing_saves: Mutex<HashSet<PlotId>>,
    failing_resolves: Mutex<HashSet<PlotId>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves of `cell` report `Ok(false)`
    pub fn reject_saves(&self, cell: PlotId) {
        self.rejected_saves.lock().unwrap().insert(cell);
    }

    /// Saves of `cell` report a backend error
    pub fn fail_saves(&self, cell: PlotId) {
        self.failing_saves.lock().unwrap().insert(cell);
    }

    pub fn fail_resolves(&self, cell: PlotId) {
        self.failing_resolves.lock().unwrap().insert(cell);
    }

    /// Hold every `resolve` until a permit is added to the returned gate
    pub fn gate_resolves(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Persisting calls: save, merge and delete
    pub fn writes(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
            + self.merges.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        for counter in [
            &self.saves,
            &self.resolves,
            &self.resolves_done,
            &self.merges,
            &self.deletes,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.saved_cells.lock().unwrap().clear();
    }
}

#[async_trait]
impl PlotStore for FlakyStore {
    async fn save(&self, cell: &PlotId, plot: &Plot) -> StoreResult<bool> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.saved_cells.lock().unwrap().push(cell.clone());
        if self.failing_saves.lock().unwrap().contains(cell) {
            return Err(StoreError::Backend(format!("cannot write {cell}")));
        }
        if self.rejected_saves.lock().unwrap().contains(cell) {
            return Ok(false);
        }
        self.inner.save(cell, plot).await
    }

    async fn plots_by_owner(&self, owner: &str, level: Option<&str>) -> StoreResult<Vec<Plot>> {
        self.inner.plots_by_owner(owner, level).await
    }

    async fn next_free_plot(&self, level: &str, limit: u32) -> StoreResult<Option<PlotId>> {
        self.inner.next_free_plot(level, limit).await
    }

    async fn resolve(&self, id: &PlotId) -> StoreResult<Option<Plot>> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        let result = if self.failing_resolves.lock().unwrap().contains(id) {
            Err(StoreError::Unavailable)
        } else {
            self.inner.resolve(id).await
        };
        self.resolves_done.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn merge(&self, merged: &MergedPlot, absorbed: &[Plot]) -> StoreResult<bool> {
        self.merges.fetch_add(1, Ordering::SeqCst);
        self.inner.merge(merged, absorbed).await
    }

    async fn delete(&self, plot: &Plot) -> StoreResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(plot).await
    }

    fn cached_peek(&self, id: &PlotId) -> Option<Plot> {
        self.inner.cached_peek(id)
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.inner.shutdown().await
    }
}

// ---------------------------------------------------------------------------
// Economy

#[derive(Default)]
pub struct Ledger {
    balances: Mutex<HashMap<String, u64>>,
    failing_credits: Mutex<HashSet<String>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, player: &str, amount: u64) {
        self.balances.lock().unwrap().insert(player.to_string(), amount);
    }

    pub fn balance(&self, player: &str) -> u64 {
        self.balances.lock().unwrap().get(player).copied().unwrap_or(0)
    }

    pub fn fail_credits_to(&self, player: &str) {
        self.failing_credits.lock().unwrap().insert(player.to_string());
    }
}

#[async_trait]
impl Economy for Ledger {
    async fn debit(&self, player: &str, amount: u64) -> bool {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(player.to_string()).or_insert(0);
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }

    async fn credit(&self, player: &str, amount: u64) -> bool {
        if self.failing_credits.lock().unwrap().contains(player) {
            return false;
        }
        *self.balances.lock().unwrap().entry(player.to_string()).or_insert(0) += amount;
        true
    }
}

// ---------------------------------------------------------------------------
// Harness

pub struct Harness {
    pub manager: PlotManager,
    pub store: Arc<FlakyStore>,
    pub world: Arc<VoxelWorld>,
    pub scheduler: Arc<TickScheduler>,
    pub ledger: Arc<Ledger>,
}

/// A manager over one registered world. `fast` turns on the bulk-editor
/// path for clearing, merging and filling; the editor is always installed.
pub fn harness(fast: bool) -> Harness {
    let registry = Arc::new(LevelSettingsRegistry::new());
    registry.add(settings()).unwrap();
    let store = Arc::new(FlakyStore::new());
    let world = Arc::new(VoxelWorld::new());
    let scheduler = Arc::new(TickScheduler::new());
    let ledger = Arc::new(Ledger::new());
    let config = EngineConfig {
        fast_clearing: fast,
        fast_filling: fast,
        max_blocks_per_tick: 64,
        ..EngineConfig::default()
    };

    let manager = PlotManager::builder(
        registry,
        store.clone(),
        world.clone(),
        scheduler.clone(),
    )
    .editor(world.clone())
    .economy(ledger.clone())
    .config(config)
    .build();

    Harness {
        manager,
        store,
        world,
        scheduler,
        ledger,
    }
}

pub fn info(owner: &str) -> PlotInfo {
    PlotInfo {
        owner: owner.to_string(),
        name: format!("{owner}'s plot"),
        ..PlotInfo::default()
    }
}

impl Harness {
    /// Store a claimed single cell directly, bypassing hooks and counters
    pub async fn seed(&self, x: i32, z: i32, owner: &str) -> Plot {
        let plot = Plot::Single(SinglePlot::new(PlotId::new(LEVEL, x, z), info(owner)));
        self.store.inner.save(plot.id(), &plot).await.unwrap();
        plot
    }

    pub async fn stored(&self, x: i32, z: i32) -> Plot {
        self.store
            .inner
            .resolve(&PlotId::new(LEVEL, x, z))
            .await
            .unwrap()
            .unwrap()
    }

    /// Drain scheduled edits
    pub fn run_ticks(&self) -> usize {
        self.scheduler.run_until_idle(100_000)
    }
}

/// Poll `condition` until it holds or about a second has passed
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..1000 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    condition()
}
