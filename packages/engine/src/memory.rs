//! In-process `PlotStore` backed by hash maps.
//!
//! Cells that were never saved resolve to unclaimed single plots. A merge
//! records the union's anchor and widths against every covered cell.

use crate::capability::PlotStore;
use async_trait::async_trait;
use plotworld_common::{StoreError, StoreResult};
use plotworld_grid::{MergedPlot, Plot, PlotId, PlotInfo, SinglePlot};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MergeSpan {
    anchor_x: i32,
    anchor_z: i32,
    x_width: u32,
    z_width: u32,
}

impl From<&MergedPlot> for MergeSpan {
    fn from(merged: &MergedPlot) -> Self {
        Self {
            anchor_x: merged.id.x,
            anchor_z: merged.id.z,
            x_width: merged.x_width,
            z_width: merged.z_width,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    cells: HashMap<PlotId, PlotInfo>,
    merges: HashMap<PlotId, MergeSpan>,
    closed: bool,
}

impl MemoryState {
    fn open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn known(&self, id: &PlotId) -> bool {
        self.cells.contains_key(id) || self.merges.contains_key(id)
    }

    fn resolve(&self, id: &PlotId) -> Plot {
        match self.merges.get(id) {
            Some(span) => {
                let anchor = PlotId::new(id.level.clone(), span.anchor_x, span.anchor_z);
                // Every covered cell carries the union's info.
                let info = self
                    .cells
                    .get(id)
                    .or_else(|| self.cells.get(&anchor))
                    .cloned()
                    .unwrap_or_default();
                Plot::Merged(MergedPlot {
                    id: anchor,
                    info,
                    x_width: span.x_width,
                    z_width: span.z_width,
                })
            }
            None => {
                let info = self.cells.get(id).cloned().unwrap_or_default();
                Plot::Single(SinglePlot::new(id.clone(), info))
            }
        }
    }

    fn is_free(&self, id: &PlotId) -> bool {
        !self.resolve(id).info().is_claimed()
    }
}

#[derive(Debug, Default)]
pub struct MemoryPlotStore {
    state: Mutex<MemoryState>,
}

impl MemoryPlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of cells with a stored record
    pub fn len(&self) -> usize {
        self.lock().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// The eight sign/swap variants of ring offset `(a, b)`, in probe order
fn ring_offsets(a: i32, b: i32) -> [(i32, i32); 8] {
    [
        (a, b),
        (b, a),
        (a, -b),
        (b, -a),
        (-a, b),
        (-b, a),
        (-a, -b),
        (-b, -a),
    ]
}

#[async_trait]
impl PlotStore for MemoryPlotStore {
    async fn save(&self, cell: &PlotId, plot: &Plot) -> StoreResult<bool> {
        let mut state = self.lock();
        state.open()?;
        state.cells.insert(cell.clone(), plot.info().clone());
        match plot {
            Plot::Merged(merged) => state.merges.insert(cell.clone(), MergeSpan::from(merged)),
            Plot::Single(_) => state.merges.remove(cell),
        };
        Ok(true)
    }

    async fn plots_by_owner(&self, owner: &str, level: Option<&str>) -> StoreResult<Vec<Plot>> {
        let state = self.lock();
        state.open()?;
        let mut found: BTreeMap<PlotId, Plot> = BTreeMap::new();
        for (id, info) in &state.cells {
            if info.owner != owner || level.is_some_and(|level| level != id.level) {
                continue;
            }
            let plot = state.resolve(id);
            found.entry(plot.id().clone()).or_insert(plot);
        }
        Ok(found.into_values().collect())
    }

    async fn next_free_plot(&self, level: &str, limit: u32) -> StoreResult<Option<PlotId>> {
        let state = self.lock();
        state.open()?;
        let taken: HashSet<(i32, i32)> = state
            .cells
            .keys()
            .chain(state.merges.keys())
            .filter(|id| id.level == level && !state.is_free(id))
            .map(|id| (id.x, id.z))
            .collect();

        let mut ring: i32 = 0;
        while limit == 0 || (ring as u32) < limit {
            let in_ring = taken
                .iter()
                .filter(|(x, z)| x.abs().max(z.abs()) == ring)
                .count();
            let ring_cells = if ring == 0 { 1 } else { 8 * ring as usize };
            if in_ring < ring_cells {
                for a in 0..=ring {
                    for (x, z) in ring_offsets(a, ring) {
                        if !taken.contains(&(x, z)) {
                            return Ok(Some(PlotId::new(level, x, z)));
                        }
                    }
                }
            }
            ring += 1;
        }
        Ok(None)
    }

    async fn resolve(&self, id: &PlotId) -> StoreResult<Option<Plot>> {
        let state = self.lock();
        state.open()?;
        Ok(Some(state.resolve(id)))
    }

    async fn merge(&self, merged: &MergedPlot, absorbed: &[Plot]) -> StoreResult<bool> {
        let mut state = self.lock();
        state.open()?;
        let span = MergeSpan::from(merged);
        for plot in absorbed {
            for cell in plot.cells() {
                state.merges.remove(&cell);
            }
        }
        for cell in merged.cells() {
            state.cells.insert(cell.clone(), merged.info.clone());
            state.merges.insert(cell, span);
        }
        Ok(true)
    }

    async fn delete(&self, plot: &Plot) -> StoreResult<bool> {
        let mut state = self.lock();
        state.open()?;
        for cell in plot.cells() {
            state.cells.remove(&cell);
            state.merges.remove(&cell);
        }
        Ok(true)
    }

    fn cached_peek(&self, id: &PlotId) -> Option<Plot> {
        let state = self.lock();
        if state.closed || !state.known(id) {
            return None;
        }
        Some(state.resolve(id))
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed(x: i32, z: i32, owner: &str) -> SinglePlot {
        let mut plot = SinglePlot::unclaimed(PlotId::new("world", x, z));
        plot.info.owner = owner.to_string();
        plot
    }

    async fn save_single(store: &MemoryPlotStore, plot: SinglePlot) -> StoreResult<bool> {
        let id = plot.id.clone();
        store.save(&id, &Plot::Single(plot)).await
    }

    #[tokio::test]
    async fn test_unknown_cell_resolves_unclaimed() {
        let store = MemoryPlotStore::new();
        let id = PlotId::new("world", 4, 4);
        let plot = store.resolve(&id).await.unwrap().unwrap();
        assert!(!plot.info().is_claimed());
        assert!(store.cached_peek(&id).is_none());
    }

    #[tokio::test]
    async fn test_merge_resolves_from_any_cell() {
        let store = MemoryPlotStore::new();
        let base = claimed(0, 0, "alice");
        save_single(&store, base.clone()).await.unwrap();
        let merged = MergedPlot::from_single(base, 2, 1);
        assert!(store.merge(&merged, &[]).await.unwrap());

        let plot = store.resolve(&PlotId::new("world", 1, 0)).await.unwrap().unwrap();
        assert_eq!(plot, Plot::Merged(merged.clone()));

        let owned = store.plots_by_owner("alice", None).await.unwrap();
        assert_eq!(owned, vec![Plot::Merged(merged)]);
    }

    #[tokio::test]
    async fn test_saving_every_cell_of_a_merged_plot_restores_the_union() {
        let store = MemoryPlotStore::new();
        let merged = MergedPlot::from_single(claimed(0, 0, "alice"), 1, 2);
        let plot = Plot::Merged(merged.clone());
        for cell in merged.cells() {
            assert!(store.save(&cell, &plot).await.unwrap());
        }

        for z in 0..2 {
            let resolved = store.resolve(&PlotId::new("world", 0, z)).await.unwrap();
            assert_eq!(resolved, Some(plot.clone()));
        }

        // Saving a cell as a single plot splits it back out.
        let single = Plot::Single(claimed(0, 1, "bob"));
        assert!(store.save(single.id(), &single).await.unwrap());
        let resolved = store.resolve(single.id()).await.unwrap();
        assert_eq!(resolved, Some(single));
    }

    #[tokio::test]
    async fn test_next_free_plot_walks_rings() {
        let store = MemoryPlotStore::new();
        assert_eq!(
            store.next_free_plot("world", 0).await.unwrap(),
            Some(PlotId::new("world", 0, 0))
        );

        save_single(&store, claimed(0, 0, "alice")).await.unwrap();
        assert_eq!(
            store.next_free_plot("world", 0).await.unwrap(),
            Some(PlotId::new("world", 0, 1))
        );

        // Ring limit 1 only inspects the origin.
        assert_eq!(store.next_free_plot("world", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_closes_store() {
        let store = MemoryPlotStore::new();
        store.shutdown().await.unwrap();
        let err = save_single(&store, claimed(0, 0, "alice")).await.unwrap_err();
        assert_eq!(err, StoreError::Closed);
        assert!(store.is_closed());
    }
}
