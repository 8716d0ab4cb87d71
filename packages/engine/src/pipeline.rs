//! # Operation Pipeline
//!
//! Every settings change runs through one template:
//!
//! ```text
//! clone ─▶ mutate clone ─▶ (no effective change? pre-cancel) ─▶ setting hook
//!       ─▶ vetoed? Ok(false) : save(proposed)
//! ```
//!
//! Compound operations are built on top and compensate instead of rolling
//! back: `buy` refunds the buyer when paying the seller fails, and `reset`
//! re-saves the disposed snapshot when clearing fails.
//!
//! Saving a merged plot writes one record per covered cell, each carrying
//! the union's shape. Every cell is attempted even after a failure, and the
//! aggregate is false if any failed.

use crate::edits::{clear_plan, fill_plan};
use crate::hooks::{
    Cancellable, CloneEvent, ClearEvent, DisposeEvent, FillEvent, ResetEvent, SaveEvent,
    SettingEvent,
};
use crate::manager::PlotManager;
use futures::future::join_all;
use plotworld_common::{PlotError, PlotResult};
use plotworld_grid::{footprint, BlockId, BlockPos, Plot, PlotInfo};
use std::sync::Arc;
use tracing::{debug, warn};

/// Biome names are stored upper-case with underscores, e.g. `ICE_PLAINS`
pub fn normalize_biome(biome: &str) -> String {
    biome.trim().to_uppercase().replace(' ', "_")
}

impl PlotManager {
    /// Clone, mutate and run the setting hook. `None` when cancelled.
    fn propose(&self, original: &Plot, mutate: impl FnOnce(&mut PlotInfo) -> bool) -> Option<Plot> {
        let mut proposed = original.clone();
        let changed = mutate(proposed.info_mut());

        let mut event = SettingEvent::new(original.clone(), proposed);
        event.set_cancelled(!changed);
        self.hooks.setting.dispatch(&mut event);
        if event.is_cancelled() {
            return None;
        }
        Some(event.plot)
    }

    async fn commit_setting(
        &self,
        original: &Plot,
        mutate: impl FnOnce(&mut PlotInfo) -> bool,
    ) -> PlotResult<bool> {
        if !self.registry.contains(original.level()) {
            return Ok(false);
        }
        match self.propose(original, mutate) {
            Some(plot) => self.save(&plot).await,
            None => Ok(false),
        }
    }

    /// Give `plot` to `claimer`, resetting its helper and denied lists
    pub async fn claim(&self, plot: &Plot, claimer: &str, name: &str) -> PlotResult<bool> {
        let claimed_at = chrono::Utc::now().timestamp_millis();
        self.commit_setting(plot, |info| {
            info.owner = claimer.to_string();
            info.helpers.clear();
            info.denied.clear();
            info.price = 0;
            info.claimed_at = Some(claimed_at);
            if !name.is_empty() {
                info.name = name.to_string();
            }
            true
        })
        .await
    }

    pub async fn rename(&self, plot: &Plot, name: &str) -> PlotResult<bool> {
        self.commit_setting(plot, |info| {
            info.name = name.to_string();
            true
        })
        .await
    }

    /// Change the biome tag and repaint the plot's columns
    pub async fn set_biome(&self, plot: &Plot, biome: &str) -> PlotResult<bool> {
        let biome = normalize_biome(biome);
        let Some(settings) = self.registry.get(plot.level()) else {
            return Ok(false);
        };
        let Some(proposed) = self.propose(plot, |info| {
            let changed = info.biome != biome;
            info.biome = biome.clone();
            changed
        }) else {
            return Ok(false);
        };

        if self.host.is_loaded(proposed.level()) {
            let area = footprint(&proposed, &settings);
            self.host.set_biome(proposed.level(), &area, &proposed.info().biome);
        }
        self.save(&proposed).await
    }

    pub async fn set_pvp(&self, plot: &Plot, pvp: bool) -> PlotResult<bool> {
        self.commit_setting(plot, |info| {
            let changed = info.pvp != pvp;
            info.pvp = pvp;
            changed
        })
        .await
    }

    pub async fn add_helper(&self, plot: &Plot, player: &str) -> PlotResult<bool> {
        self.commit_setting(plot, |info| info.add_helper(player)).await
    }

    pub async fn remove_helper(&self, plot: &Plot, player: &str) -> PlotResult<bool> {
        self.commit_setting(plot, |info| info.remove_helper(player)).await
    }

    pub async fn add_denied(&self, plot: &Plot, player: &str) -> PlotResult<bool> {
        self.commit_setting(plot, |info| info.deny_player(player)).await
    }

    pub async fn remove_denied(&self, plot: &Plot, player: &str) -> PlotResult<bool> {
        self.commit_setting(plot, |info| info.undeny_player(player)).await
    }

    /// Put the plot up for sale. Needs an economy and a non-zero price.
    pub async fn sell(&self, plot: &Plot, price: u64) -> PlotResult<bool> {
        if self.economy.is_none() || price == 0 {
            return Ok(false);
        }
        self.commit_setting(plot, |info| {
            info.price = price;
            true
        })
        .await
    }

    /// Pay the seller the asking price and claim the plot for `buyer`.
    ///
    /// Money moves before ownership does. If the seller cannot be credited
    /// the buyer is refunded; if the claim then fails both transfers are
    /// reversed.
    pub async fn buy(&self, plot: &Plot, buyer: &str) -> PlotResult<bool> {
        let Some(economy) = self.economy.as_ref() else {
            return Ok(false);
        };
        if !self.registry.contains(plot.level()) {
            return Ok(false);
        }
        let price = plot.info().price;
        let seller = plot.info().owner.clone();

        if !economy.debit(buyer, price).await {
            return Ok(false);
        }
        if !economy.credit(&seller, price).await {
            warn!(plot = %plot.id(), buyer, seller = %seller, price, "refunding buyer after failed credit");
            if !economy.credit(buyer, price).await {
                warn!(plot = %plot.id(), buyer, price, "refund failed");
            }
            return Ok(false);
        }

        let claimed = self.claim(plot, buyer, "").await;
        if !matches!(claimed, Ok(true)) {
            warn!(plot = %plot.id(), buyer, seller = %seller, price, "reversing sale after failed claim");
            if !economy.debit(&seller, price).await || !economy.credit(buyer, price).await {
                warn!(plot = %plot.id(), buyer, seller = %seller, price, "sale reversal incomplete");
            }
        }
        claimed
    }

    /// Remove the plot from storage and from the cache
    pub async fn dispose(&self, plot: &Plot) -> PlotResult<bool> {
        if !self.registry.contains(plot.level()) {
            return Ok(false);
        }
        let mut event = DisposeEvent::new(plot.clone());
        self.hooks.dispose.dispatch(&mut event);
        if event.is_cancelled() {
            return Ok(false);
        }
        let deleted = self.store.delete(&event.plot).await?;
        if deleted {
            self.cache.remove(&event.plot);
        }
        Ok(deleted)
    }

    /// Dispose, then clear. A failed clear re-saves the disposed snapshot.
    pub async fn reset(&self, plot: &Plot, max_blocks_per_tick: u32) -> PlotResult<bool> {
        if !self.registry.contains(plot.level()) {
            return Ok(false);
        }
        let mut event = ResetEvent::new(plot.clone());
        self.hooks.reset.dispatch(&mut event);
        if event.is_cancelled() {
            return Ok(false);
        }
        let snapshot = event.plot;

        if !self.dispose(&snapshot).await? {
            return Ok(false);
        }
        if !self.clear(&snapshot, max_blocks_per_tick) {
            warn!(plot = %snapshot.id(), "clear failed after dispose; restoring plot");
            self.save(&snapshot).await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Regenerate the plot's terrain and border walls. Does not persist.
    pub fn clear(&self, plot: &Plot, max_blocks_per_tick: u32) -> bool {
        let mut event = ClearEvent::new(plot.clone(), max_blocks_per_tick);
        self.hooks.clear.dispatch(&mut event);
        if event.is_cancelled() {
            return false;
        }
        let Some(settings) = self.registry.get(event.plot.level()) else {
            return false;
        };
        if !self.host.is_loaded(event.plot.level()) {
            return false;
        }

        let plan = clear_plan(&event.plot, &settings);
        match self.fast_editor(self.config.fast_clearing) {
            Some(editor) => {
                self.clear_entities(&event.plot, &footprint(&event.plot, &settings).expanded_xz(1));
                let report = plan.apply(editor.as_ref());
                debug!(
                    plot = %event.plot.id(),
                    blocks = report.blocks_changed,
                    elapsed = ?report.elapsed,
                    "plot cleared"
                );
            }
            None => {
                let rate = self.config.rate_or_default(event.max_blocks_per_tick);
                self.scheduler
                    .schedule(Box::new(plan.into_task(Arc::clone(&self.host), rate)));
            }
        }
        true
    }

    /// Replace the ground of the plot with `block`. Does not persist.
    pub fn fill(&self, plot: &Plot, block: &BlockId, max_blocks_per_tick: u32) -> bool {
        let mut event = FillEvent::new(plot.clone(), block.clone(), max_blocks_per_tick);
        self.hooks.fill.dispatch(&mut event);
        if event.is_cancelled() {
            return false;
        }
        let Some(settings) = self.registry.get(event.plot.level()) else {
            return false;
        };
        if !self.host.is_loaded(event.plot.level()) {
            return false;
        }

        let plan = fill_plan(&event.plot, &event.block, &settings);
        match self.fast_editor(self.config.fast_filling) {
            Some(editor) => {
                self.clear_entities(&event.plot, &footprint(&event.plot, &settings));
                let report = plan.apply(editor.as_ref());
                debug!(
                    plot = %event.plot.id(),
                    block = %event.block,
                    blocks = report.blocks_changed,
                    elapsed = ?report.elapsed,
                    "plot filled"
                );
            }
            None => {
                let rate = self.config.rate_or_default(event.max_blocks_per_tick);
                self.scheduler
                    .schedule(Box::new(plan.into_task(Arc::clone(&self.host), rate)));
            }
        }
        true
    }

    /// Copy the terrain of `from` over `to`, walls included.
    ///
    /// Needs the bulk editor. Both plots must have the same shape.
    pub fn clone_plot(&self, from: &Plot, to: &Plot) -> bool {
        let Some(editor) = self.editor.as_ref() else {
            return false;
        };
        let mut event = CloneEvent::new(from.clone(), to.clone());
        self.hooks.clone.dispatch(&mut event);
        if event.is_cancelled() {
            return false;
        }
        let (from, to) = (event.from, event.to);
        if from.is_merged() != to.is_merged() || from.widths() != to.widths() {
            return false;
        }
        let (Some(from_settings), Some(to_settings)) =
            (self.registry.get(from.level()), self.registry.get(to.level()))
        else {
            return false;
        };
        if !self.host.is_loaded(from.level()) || !self.host.is_loaded(to.level()) {
            return false;
        }

        let source = footprint(&from, &from_settings).expanded_xz(1);
        let target = footprint(&to, &to_settings).expanded_xz(1);
        self.clear_entities(&to, &target);

        let copied = editor.copy(from.level(), &source);
        let pasted = editor.paste(
            to.level(),
            BlockPos::new(target.min.x, source.min.y, target.min.z),
        );
        debug!(
            from = %from.id(),
            to = %to.id(),
            copied = copied.blocks_changed,
            pasted = pasted.blocks_changed,
            elapsed = ?(copied.elapsed + pasted.elapsed),
            "plot cloned"
        );
        true
    }

    /// Persist every covered cell of `plot`.
    ///
    /// The save hook may replace the plot first. The cache is refreshed only
    /// when every cell saved, and invalidated otherwise. Plots of worlds
    /// without settings are not saved.
    pub async fn save(&self, plot: &Plot) -> PlotResult<bool> {
        if !self.registry.contains(plot.level()) {
            return Ok(false);
        }
        let mut event = SaveEvent::new(plot.clone());
        self.hooks.save.dispatch(&mut event);
        let plot = event.plot;

        let cells = plot.cells();
        let results = join_all(cells.iter().map(|cell| self.store.save(cell, &plot))).await;

        let mut saved = true;
        let mut first_error: Option<PlotError> = None;
        for (cell, result) in cells.iter().zip(results) {
            match result {
                Ok(true) => {}
                Ok(false) => {
                    warn!(plot = %plot.id(), cell = %cell, "cell save failed");
                    saved = false;
                }
                Err(err) => {
                    warn!(plot = %plot.id(), cell = %cell, error = %err, "cell save errored");
                    saved = false;
                    first_error.get_or_insert(err.into());
                }
            }
        }

        if saved {
            self.cache.insert(&plot);
        } else {
            self.cache.remove(&plot);
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(saved),
        }
    }

    /// Save each plot in turn, attempting all of them
    pub async fn save_all(&self, plots: &[Plot]) -> PlotResult<bool> {
        let mut saved = true;
        let mut first_error = None;
        for plot in plots {
            match self.save(plot).await {
                Ok(ok) => saved &= ok,
                Err(err) => {
                    saved = false;
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(saved),
        }
    }
}
