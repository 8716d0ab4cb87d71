//! # Edit Plans
//!
//! World edits are described once as an ordered list of `(region, block)`
//! steps and then executed by one of two interchangeable strategies:
//!
//! ```text
//!              ┌─ apply(editor) ──────────── all steps now, via the bulk editor
//! EditPlan ────┤
//!              └─ into_task(host, rate) ──── ScheduledEdit, `rate` blocks per tick
//! ```
//!
//! Later steps overwrite earlier ones, and both strategies walk the steps in
//! the same order, so they converge on the same final blocks.

use crate::capability::{EditReport, TickStatus, TickTask, WorldEditor, WorldHost};
use plotworld_grid::{footprint, Axis, BlockId, BlockPos, Facing, LevelSettings, Plot, Region};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditStep {
    pub region: Region,
    pub block: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    pub level: String,
    pub steps: Vec<EditStep>,
}

impl EditPlan {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, region: Region, block: &BlockId) {
        self.steps.push(EditStep {
            region,
            block: block.clone(),
        });
    }

    /// Push `column` restricted to `min_y..=max_y`, skipping empty ranges
    fn push_layer(&mut self, column: &Region, min_y: i64, max_y: i64, block: &BlockId) {
        if min_y <= max_y {
            self.push(column.with_y(min_y, max_y), block);
        }
    }

    /// Air above ground, then floor, fill and bottom
    fn push_plot_layers(&mut self, column: &Region, settings: &LevelSettings) {
        let ground = settings.ground_height;
        self.push_layer(column, ground + 1, settings.max_y, &BlockId::air());
        self.push_ground_layers(column, settings);
    }

    fn push_ground_layers(&mut self, column: &Region, settings: &LevelSettings) {
        let ground = settings.ground_height;
        self.push_layer(column, ground, ground, &settings.floor_block);
        self.push_layer(column, settings.min_y + 1, ground - 1, &settings.fill_block);
        self.push_layer(column, settings.min_y, settings.min_y, &settings.bottom_block);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Blocks touched, counting overlaps once per step
    pub fn total_blocks(&self) -> u64 {
        self.steps.iter().map(|step| step.region.volume()).sum()
    }

    /// Run every step now through the bulk editor
    pub fn apply(&self, editor: &dyn WorldEditor) -> EditReport {
        let mut total = EditReport::default();
        for step in &self.steps {
            let report = editor.fill(&self.level, &step.region, &step.block);
            debug!(
                level = %self.level,
                block = %step.block,
                region = %step.region,
                blocks = report.blocks_changed,
                elapsed = ?report.elapsed,
                "set blocks"
            );
            total += report;
        }
        total
    }

    /// Spread the plan over ticks; a rate of 0 is treated as 1
    pub fn into_task(self, host: Arc<dyn WorldHost>, max_blocks_per_tick: u32) -> ScheduledEdit {
        ScheduledEdit {
            plan: self,
            host,
            max_blocks_per_tick: max_blocks_per_tick.max(1),
            step: 0,
            cursor: 0,
            changed: 0,
            started: Instant::now(),
        }
    }
}

/// Region with `along` on the direction's axis and `across` on the other
fn span(axis: Axis, along: (i64, i64), across: (i64, i64), y: i64) -> Region {
    match axis {
        Axis::X => Region::new(
            BlockPos::new(along.0, y, across.0),
            BlockPos::new(along.1, y, across.1),
        ),
        Axis::Z => Region::new(
            BlockPos::new(across.0, y, along.0),
            BlockPos::new(across.1, y, along.1),
        ),
    }
}

fn extent(region: &Region, axis: Axis) -> (i64, i64) {
    match axis {
        Axis::X => (region.min.x, region.max.x),
        Axis::Z => (region.min.z, region.max.z),
    }
}

/// Road removal for merging `before` with the row of cells in `direction`.
///
/// Opens the road strip between the footprint and the new row across the
/// full perpendicular extent, walls both ends of that strip, then opens the
/// roads between the newly absorbed cells and walls their outer end.
pub fn merge_plan(before: &Plot, direction: Facing, settings: &LevelSettings) -> EditPlan {
    let mut plan = EditPlan::new(before.level());
    let road = i64::from(settings.road_width);
    if road == 0 {
        return plan;
    }

    let axis = direction.axis();
    let across_axis = match axis {
        Axis::X => Axis::Z,
        Axis::Z => Axis::X,
    };
    let plot_size = i64::from(settings.plot_size);
    let total = settings.total_size();
    let wall_y = settings.ground_height + 1;

    let fp = footprint(before, settings);
    let (near, far) = extent(&fp, axis);
    let (across_min, across_max) = extent(&fp, across_axis);

    let strip = if direction.is_positive() {
        (far + 1, far + road)
    } else {
        (near - road, near - 1)
    };
    plan.push_plot_layers(&span(axis, strip, (across_min, across_max), 0), settings);
    plan.push(
        span(axis, strip, (across_min - 1, across_min - 1), wall_y),
        &settings.wall_block,
    );
    plan.push(
        span(axis, strip, (across_max + 1, across_max + 1), wall_y),
        &settings.wall_block,
    );

    let row_start = if direction.is_positive() {
        far + road + 1
    } else {
        near - total
    };
    let row = (row_start, row_start + plot_size - 1);
    let outer_wall = if direction.is_positive() {
        row.1 + 1
    } else {
        row.0 - 1
    };
    let (x_width, z_width) = before.widths();
    let cells_across = i64::from(match axis {
        Axis::X => z_width,
        Axis::Z => x_width,
    });
    for k in 0..cells_across - 1 {
        let gap_start = across_min + total * k + plot_size;
        let gap = (gap_start, gap_start + road - 1);
        plan.push_plot_layers(&span(axis, row, gap, 0), settings);
        plan.push(
            span(axis, (outer_wall, outer_wall), gap, wall_y),
            &settings.wall_block,
        );
    }

    plan
}

/// Reset a plot to freshly generated terrain and redraw its border walls
pub fn clear_plan(plot: &Plot, settings: &LevelSettings) -> EditPlan {
    let mut plan = EditPlan::new(plot.level());
    let fp = footprint(plot, settings);
    let ground = settings.ground_height;

    if settings.road_width == 0 {
        plan.push_plot_layers(&fp, settings);
        return plan;
    }

    let ring = fp.expanded_xz(1);
    plan.push_layer(&ring, ground + 1, settings.max_y, &BlockId::air());
    plan.push_ground_layers(&fp, settings);

    let wall_y = ground + 1;
    let (min, max) = (ring.min, ring.max);
    for (a, b) in [
        (BlockPos::new(min.x, wall_y, min.z), BlockPos::new(max.x, wall_y, min.z)),
        (BlockPos::new(min.x, wall_y, max.z), BlockPos::new(max.x, wall_y, max.z)),
        (BlockPos::new(min.x, wall_y, min.z), BlockPos::new(min.x, wall_y, max.z)),
        (BlockPos::new(max.x, wall_y, min.z), BlockPos::new(max.x, wall_y, max.z)),
    ] {
        plan.push(Region::new(a, b), &settings.wall_block);
    }
    plan
}

/// Replace everything between the bottom layer and the floor with `block`
pub fn fill_plan(plot: &Plot, block: &BlockId, settings: &LevelSettings) -> EditPlan {
    let mut plan = EditPlan::new(plot.level());
    let fp = footprint(plot, settings);
    plan.push_layer(&fp, settings.min_y + 1, settings.ground_height, block);
    plan
}

/// An `EditPlan` applied block by block through the world host
pub struct ScheduledEdit {
    plan: EditPlan,
    host: Arc<dyn WorldHost>,
    max_blocks_per_tick: u32,
    step: usize,
    cursor: u64,
    changed: u64,
    started: Instant,
}

impl ScheduledEdit {
    pub fn is_finished(&self) -> bool {
        self.step >= self.plan.steps.len()
    }

    /// Skip past steps whose blocks have all been placed
    fn settle(&mut self) {
        while let Some(step) = self.plan.steps.get(self.step) {
            if self.cursor < step.region.volume() {
                break;
            }
            self.step += 1;
            self.cursor = 0;
        }
    }
}

impl TickTask for ScheduledEdit {
    fn tick(&mut self) -> TickStatus {
        let mut budget = u64::from(self.max_blocks_per_tick);
        self.settle();
        while budget > 0 && !self.is_finished() {
            let step = &self.plan.steps[self.step];
            if let Some(pos) = step.region.nth_block(self.cursor) {
                if self.host.set_block(&self.plan.level, pos, &step.block) {
                    self.changed += 1;
                }
            }
            self.cursor += 1;
            budget -= 1;
            self.settle();
        }

        if self.is_finished() {
            debug!(
                level = %self.plan.level,
                blocks = self.changed,
                elapsed = ?self.started.elapsed(),
                "scheduled edit finished"
            );
            TickStatus::Done
        } else {
            TickStatus::Pending
        }
    }
}
