//! The bulk-editor path and the scheduled path must leave identical worlds
//! and identical persisted plots.

mod support;

use plotworld_engine::EntityKind;
use plotworld_grid::{BlockId, BlockPos, Facing, Plot};
use std::sync::atomic::Ordering;
use support::{harness, Harness};

/// Some clutter on plots and roads so every edit has something to undo
fn decorate(h: &Harness) {
    for (x, y, z, block) in [
        (1, 4, 1, "minecraft:glass"),
        (2, 5, 3, "minecraft:oak_log"),
        (4, 3, 2, "minecraft:oak_planks"),
        (5, 4, 0, "minecraft:stone_slab"),
        (7, 2, 1, "minecraft:diamond_ore"),
        (9, 6, 9, "minecraft:torch"),
        (-1, 4, -1, "minecraft:stone_slab"),
    ] {
        h.world.put(BlockPos::new(x, y, z), block);
    }
}

async fn seeded_pair(fast: bool) -> Harness {
    let h = harness(fast);
    decorate(&h);
    for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        h.seed(x, z, "alice").await;
    }
    h
}

async fn persisted(h: &Harness) -> Vec<Plot> {
    let mut plots = Vec::new();
    for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        plots.push(h.stored(x, z).await);
    }
    plots
}

#[tokio::test]
async fn test_merge_paths_converge() {
    let fast = seeded_pair(true).await;
    let slow = seeded_pair(false).await;

    for h in [&fast, &slow] {
        let plot = h.stored(0, 0).await;
        assert!(h.manager.merge(&plot, Facing::East, 7).await.unwrap());
        // Scheduled edits of overlapping regions must not interleave.
        h.run_ticks();
        let plot = h.stored(0, 0).await;
        assert!(h.manager.merge(&plot, Facing::South, 7).await.unwrap());
        h.run_ticks();
    }

    assert!(fast.world.bulk_fills.load(Ordering::SeqCst) > 0);
    assert_eq!(slow.world.bulk_fills.load(Ordering::SeqCst), 0);
    assert_eq!(fast.world.snapshot(), slow.world.snapshot());
    assert_eq!(persisted(&fast).await, persisted(&slow).await);
    assert_eq!(fast.stored(1, 1).await.widths(), (2, 2));
}

#[tokio::test]
async fn test_clear_paths_converge() {
    let fast = seeded_pair(true).await;
    let slow = seeded_pair(false).await;

    for h in [&fast, &slow] {
        let plot = h.stored(1, 1).await;
        assert!(h.manager.clear(&plot, 5));
        h.run_ticks();
    }

    assert_eq!(fast.world.snapshot(), slow.world.snapshot());
    assert_eq!(persisted(&fast).await, persisted(&slow).await);
}

#[tokio::test]
async fn test_fill_paths_converge() {
    let fast = seeded_pair(true).await;
    let slow = seeded_pair(false).await;
    let sand = BlockId::new("minecraft:sand");

    for h in [&fast, &slow] {
        let plot = h.stored(1, 0).await;
        assert!(h.manager.fill(&plot, &sand, 3));
        h.run_ticks();
    }

    assert_eq!(fast.world.snapshot(), slow.world.snapshot());
    assert_eq!(fast.world.block(BlockPos::new(7, 2, 1)), sand);
}

#[tokio::test]
async fn test_scheduled_clear_respects_rate() {
    let h = seeded_pair(false).await;
    let plot = h.stored(0, 0).await;
    // Entities are only moved on the bulk path.
    h.world.spawn(9, EntityKind::Other, 1.5, 1.5);

    assert!(h.manager.clear(&plot, 10));
    let before = h.world.snapshot();
    h.scheduler.run_tick();
    let changed = h
        .world
        .snapshot()
        .iter()
        .filter(|(pos, block)| before.get(pos) != Some(block))
        .count();
    assert!(changed <= 10);
    assert!(h.scheduler.pending() > 0);
    assert!(h.world.despawned.lock().unwrap().is_empty());

    h.run_ticks();
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_zero_rate_falls_back_to_config() {
    let h = seeded_pair(false).await;
    let plot = h.stored(0, 0).await;

    assert!(h.manager.clear(&plot, 0));
    // Configured at 64 blocks per tick in the harness.
    let ticks = h.run_ticks();
    let plan = plotworld_engine::edits::clear_plan(&plot, &support::settings());
    assert_eq!(ticks as u64, plan.total_blocks().div_ceil(64));
}
