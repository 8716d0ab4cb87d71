//! # Plot Cache
//!
//! Synchronous, non-blocking view of plot state for hot paths (movement and
//! block checks) that cannot wait on the store.
//!
//! ```text
//! get(id)
//!   ├─ own entry ─────────────▶ Resolved
//!   ├─ store.cached_peek ─────▶ Resolved
//!   └─ miss ──▶ Unresolved     (at most one population per id in flight)
//!                  │
//!                  └─ spawn: store.resolve(id) ──▶ write back if slot still current
//! ```
//!
//! Every population is tagged with a slot number. `insert` and `remove`
//! retire the slot of any population in flight for the same cell, so a late
//! completion can never overwrite fresher data.

use crate::capability::PlotStore;
use plotworld_grid::{Plot, PlotId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPlot {
    /// Nothing known yet; carries the requested cell
    Unresolved(PlotId),
    Resolved(Plot),
}

impl CachedPlot {
    pub fn resolved(&self) -> Option<&Plot> {
        match self {
            CachedPlot::Resolved(plot) => Some(plot),
            CachedPlot::Unresolved(_) => None,
        }
    }

    pub fn into_resolved(self) -> Option<Plot> {
        match self {
            CachedPlot::Resolved(plot) => Some(plot),
            CachedPlot::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    /// Keyed by every covered cell, so a merged plot appears once per cell
    entries: HashMap<PlotId, Plot>,
    /// Cell -> slot of the population currently allowed to write it
    in_flight: HashMap<PlotId, u64>,
    next_slot: u64,
}

impl CacheState {
    fn store(&mut self, plot: &Plot) {
        for cell in plot.cells() {
            self.in_flight.remove(&cell);
            self.entries.insert(cell, plot.clone());
        }
    }

    fn forget(&mut self, plot: &Plot) {
        for cell in plot.cells() {
            self.in_flight.remove(&cell);
            self.entries.remove(&cell);
        }
    }
}

#[derive(Clone)]
pub struct PlotCache {
    store: Arc<dyn PlotStore>,
    state: Arc<Mutex<CacheState>>,
}

impl PlotCache {
    pub fn new(store: Arc<dyn PlotStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        lock_state(&self.state)
    }

    /// Never blocks. With `trigger_population`, a miss starts a background
    /// resolve unless one is already running for `id`.
    pub fn get(&self, id: &PlotId, trigger_population: bool) -> CachedPlot {
        if let Some(plot) = self.lock().entries.get(id) {
            return CachedPlot::Resolved(plot.clone());
        }
        if let Some(plot) = self.store.cached_peek(id) {
            return CachedPlot::Resolved(plot);
        }
        if trigger_population {
            self.populate(id);
        }
        CachedPlot::Unresolved(id.clone())
    }

    fn populate(&self, id: &PlotId) {
        let slot = {
            let mut state = self.lock();
            if state.entries.contains_key(id) || state.in_flight.contains_key(id) {
                return;
            }
            let slot = state.next_slot;
            state.next_slot += 1;
            state.in_flight.insert(id.clone(), slot);
            slot
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(%id, "no async runtime; cache population skipped");
                self.lock().in_flight.remove(id);
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let id = id.clone();
        runtime.spawn(async move {
            let result = store.resolve(&id).await;
            let mut state = lock_state(&state);
            if state.in_flight.get(&id) != Some(&slot) {
                debug!(%id, slot, "discarding superseded cache population");
                return;
            }
            state.in_flight.remove(&id);
            match result {
                Ok(Some(plot)) => state.store(&plot),
                Ok(None) => debug!(%id, "plot not found during cache population"),
                Err(err) => debug!(%id, error = %err, "cache population failed"),
            }
        });
    }

    /// Store `plot` under every cell it covers
    pub fn insert(&self, plot: &Plot) {
        self.lock().store(plot);
    }

    /// Drop `plot` from every cell it covers and retire pending populations
    pub fn remove(&self, plot: &Plot) {
        self.lock().forget(plot);
    }

    /// Number of populations still running
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn is_in_flight(&self, id: &PlotId) -> bool {
        self.lock().in_flight.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPlotStore;
    use plotworld_grid::{MergedPlot, SinglePlot};

    fn cache() -> PlotCache {
        PlotCache::new(Arc::new(MemoryPlotStore::new()))
    }

    #[test]
    fn test_miss_without_trigger_starts_nothing() {
        let cache = cache();
        let id = PlotId::new("world", 3, 4);
        assert_eq!(cache.get(&id, false), CachedPlot::Unresolved(id.clone()));
        assert_eq!(cache.in_flight(), 0);
    }

    #[test]
    fn test_merged_insert_covers_every_cell() {
        let cache = cache();
        let merged = MergedPlot::from_single(SinglePlot::unclaimed(PlotId::new("world", 0, 0)), 2, 2);
        cache.insert(&Plot::Merged(merged.clone()));
        assert_eq!(cache.len(), 4);

        let hit = cache.get(&PlotId::new("world", 1, 1), false);
        assert_eq!(hit.resolved().map(|p| p.id().clone()), Some(PlotId::new("world", 0, 0)));

        cache.remove(&Plot::Merged(merged));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_trigger_outside_runtime_does_not_panic() {
        let cache = cache();
        let id = PlotId::new("world", 0, 0);
        assert!(cache.get(&id, true).resolved().is_none());
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_population_fills_entry() {
        let cache = cache();
        let id = PlotId::new("world", 7, -2);
        assert!(cache.get(&id, true).resolved().is_none());

        for _ in 0..100 {
            if cache.in_flight() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        let hit = cache.get(&id, false);
        assert_eq!(hit.into_resolved().map(|p| p.id().clone()), Some(id));
    }
}
