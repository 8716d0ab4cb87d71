//! # Merge Engine
//!
//! Grows a plot by one row of cells in a direction.
//!
//! ```text
//! resolve plot ─▶ candidate row ─▶ resolve row (concurrent) ─▶ validate
//!      ─▶ union ─▶ merge hook ─▶ road edits (fast | scheduled) ─▶ persist
//! ```
//!
//! The candidate row is the line of cells touching the plot's far edge in
//! the merge direction, one cell per unit of the plot's perpendicular width.
//! Nothing is written before validation and the hook have both passed.

use crate::edits::merge_plan;
use crate::hooks::{Cancellable, MergeEvent};
use crate::manager::PlotManager;
use futures::future::join_all;
use plotworld_common::PlotResult;
use plotworld_grid::{bounding_box, Axis, Facing, MergedPlot, Plot, PlotId};
use std::sync::Arc;
use tracing::debug;

/// Cells a merge of `plot` in `direction` would absorb, in row order
pub fn merge_candidates(plot: &Plot, direction: Facing) -> Vec<PlotId> {
    let (x_width, z_width) = plot.widths();
    let id = plot.id();
    let first = match direction {
        Facing::East => id.side(Facing::East, x_width as i32),
        Facing::South => id.side(Facing::South, z_width as i32),
        Facing::West | Facing::North => id.side(direction, 1),
    };
    let (along, count) = match direction.axis() {
        Axis::X => (Facing::South, z_width),
        Axis::Z => (Facing::East, x_width),
    };
    (0..count as i32).map(|k| first.side(along, k)).collect()
}

/// The union of `plot` and its candidate row in `direction`
pub fn merged_union(plot: &Plot, direction: Facing) -> MergedPlot {
    let (x_width, z_width) = plot.widths();
    let mut merged = MergedPlot {
        id: plot.id().clone(),
        info: plot.info().clone(),
        x_width,
        z_width,
    };
    match direction {
        Facing::East => merged.x_width += 1,
        Facing::South => merged.z_width += 1,
        Facing::West => {
            merged.x_width += 1;
            merged.id.x -= 1;
        }
        Facing::North => {
            merged.z_width += 1;
            merged.id.z -= 1;
        }
    }
    merged
}

impl PlotManager {
    /// Merge `plot` with the row of cells next to it in `direction`.
    ///
    /// `Ok(false)` means nothing changed: unknown world, an unsuitable
    /// candidate, a veto, or an unloaded world. Store failures are errors.
    pub async fn merge(&self, plot: &Plot, direction: Facing, max_blocks_per_tick: u32) -> PlotResult<bool> {
        let Some(settings) = self.registry.get(plot.level()) else {
            return Ok(false);
        };
        let Some(current) = self.store.resolve(plot.id()).await? else {
            return Ok(false);
        };

        let candidates = merge_candidates(&current, direction);
        let resolved = join_all(candidates.iter().map(|id| self.store.resolve(id)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let mut absorbed = Vec::with_capacity(resolved.len());
        for (id, candidate) in candidates.iter().zip(resolved) {
            match candidate {
                Some(Plot::Single(single))
                    if single.id.level == current.level()
                        && single.info.owner == current.info().owner =>
                {
                    absorbed.push(Plot::Single(single));
                }
                other => {
                    debug!(
                        plot = %current.id(),
                        candidate = %id,
                        merged = other.as_ref().is_some_and(Plot::is_merged),
                        "merge candidate rejected"
                    );
                    return Ok(false);
                }
            }
        }

        let mut event = MergeEvent::new(merged_union(&current, direction), direction, absorbed);
        self.hooks.merge.dispatch(&mut event);
        if event.is_cancelled() {
            return Ok(false);
        }
        if !self.host.is_loaded(current.level()) {
            return Ok(false);
        }
        let (merged, absorbed) = event.into_parts();
        let merged_plot = Plot::Merged(merged.clone());

        let plan = merge_plan(&current, direction, &settings);
        match self.fast_editor(self.config.fast_clearing) {
            Some(editor) => {
                self.clear_entities(&merged_plot, &bounding_box(&merged_plot, &settings).expanded_xz(1));
                let report = plan.apply(editor.as_ref());
                debug!(
                    plot = %merged.id,
                    direction = %direction,
                    blocks = report.blocks_changed,
                    elapsed = ?report.elapsed,
                    "merge edits applied"
                );
            }
            None => {
                let rate = self.config.rate_or_default(max_blocks_per_tick);
                self.scheduler
                    .schedule(Box::new(plan.into_task(Arc::clone(&self.host), rate)));
            }
        }

        let merged_ok = self.store.merge(&merged, &absorbed).await?;
        if merged_ok {
            self.cache.insert(&merged_plot);
        }
        Ok(merged_ok)
    }
}
