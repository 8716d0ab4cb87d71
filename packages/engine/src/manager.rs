//! # Plot Manager
//!
//! Entry point owning the registry, store, cache, hooks and capabilities.
//! Operations live in sibling modules as further `impl PlotManager` blocks:
//!
//! - `merge`     merging plots
//! - `pipeline`  settings changes, sale, dispose/reset, clear/fill/clone, save
//! - `placement` teleporting entities onto plots
//!
//! ```rust,ignore
//! let manager = PlotManager::builder(registry, store, host, scheduler)
//!     .editor(editor)
//!     .config(config)
//!     .build();
//! let plot = manager.plot_by_position(&location).await?;
//! ```

use crate::cache::{CachedPlot, PlotCache};
use crate::capability::{Economy, PlotStore, Scheduler, WorldEditor, WorldHost};
use crate::config::EngineConfig;
use crate::hooks::HookBus;
use plotworld_common::PlotResult;
use plotworld_grid::{locate, LevelSettings, LevelSettingsRegistry, Location, Plot, PlotId, Region};
use std::sync::Arc;
use tracing::info;

pub struct PlotManager {
    pub(crate) registry: Arc<LevelSettingsRegistry>,
    pub(crate) store: Arc<dyn PlotStore>,
    pub(crate) cache: PlotCache,
    pub(crate) hooks: Arc<HookBus>,
    pub(crate) config: EngineConfig,
    pub(crate) host: Arc<dyn WorldHost>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) editor: Option<Arc<dyn WorldEditor>>,
    pub(crate) economy: Option<Arc<dyn Economy>>,
}

pub struct PlotManagerBuilder {
    registry: Arc<LevelSettingsRegistry>,
    store: Arc<dyn PlotStore>,
    host: Arc<dyn WorldHost>,
    scheduler: Arc<dyn Scheduler>,
    hooks: Arc<HookBus>,
    config: EngineConfig,
    editor: Option<Arc<dyn WorldEditor>>,
    economy: Option<Arc<dyn Economy>>,
}

impl PlotManagerBuilder {
    pub fn editor(mut self, editor: Arc<dyn WorldEditor>) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn economy(mut self, economy: Arc<dyn Economy>) -> Self {
        self.economy = Some(economy);
        self
    }

    pub fn hooks(mut self, hooks: Arc<HookBus>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> PlotManager {
        info!(
            worlds = self.registry.len(),
            editor = self.editor.is_some(),
            economy = self.economy.is_some(),
            "plot manager ready"
        );
        PlotManager {
            cache: PlotCache::new(Arc::clone(&self.store)),
            registry: self.registry,
            store: self.store,
            hooks: self.hooks,
            config: self.config,
            host: self.host,
            scheduler: self.scheduler,
            editor: self.editor,
            economy: self.economy,
        }
    }
}

impl PlotManager {
    pub fn builder(
        registry: Arc<LevelSettingsRegistry>,
        store: Arc<dyn PlotStore>,
        host: Arc<dyn WorldHost>,
        scheduler: Arc<dyn Scheduler>,
    ) -> PlotManagerBuilder {
        PlotManagerBuilder {
            registry,
            store,
            host,
            scheduler,
            hooks: Arc::new(HookBus::new()),
            config: EngineConfig::default(),
            editor: None,
            economy: None,
        }
    }

    pub fn registry(&self) -> &LevelSettingsRegistry {
        &self.registry
    }

    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn cache(&self) -> &PlotCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self, level: &str) -> Option<Arc<LevelSettings>> {
        self.registry.get(level)
    }

    /// Authoritative lookup through the store; refreshes the cache
    pub async fn plot(&self, id: &PlotId) -> PlotResult<Option<Plot>> {
        if !self.registry.contains(&id.level) {
            return Ok(None);
        }
        let plot = self.store.resolve(id).await?;
        if let Some(plot) = &plot {
            self.cache.insert(plot);
        }
        Ok(plot)
    }

    /// `None` for roads and worlds without plots
    pub async fn plot_by_position(&self, location: &Location) -> PlotResult<Option<Plot>> {
        let Some(settings) = self.registry.get(&location.level) else {
            return Ok(None);
        };
        match locate(location.x, location.z, &settings) {
            Some(id) => self.plot(&id).await,
            None => Ok(None),
        }
    }

    /// Non-blocking lookup for hot paths
    pub fn cached_plot(&self, id: &PlotId, trigger_population: bool) -> CachedPlot {
        self.cache.get(id, trigger_population)
    }

    pub fn cached_plot_at(&self, location: &Location, trigger_population: bool) -> Option<CachedPlot> {
        let settings = self.registry.get(&location.level)?;
        let id = locate(location.x, location.z, &settings)?;
        Some(self.cache.get(&id, trigger_population))
    }

    pub async fn plots_of_player(&self, owner: &str, level: Option<&str>) -> PlotResult<Vec<Plot>> {
        Ok(self.store.plots_by_owner(owner, level).await?)
    }

    /// Nearest unclaimed cell to the grid origin
    pub async fn next_free_plot(&self, level: &str, limit: u32) -> PlotResult<Option<PlotId>> {
        if !self.registry.contains(level) {
            return Ok(None);
        }
        Ok(self.store.next_free_plot(level, limit).await?)
    }

    pub async fn shutdown(&self) -> PlotResult<()> {
        self.store.shutdown().await?;
        info!("plot store closed");
        Ok(())
    }

    /// The bulk editor, if installed and `enabled`
    pub(crate) fn fast_editor(&self, enabled: bool) -> Option<&Arc<dyn WorldEditor>> {
        self.editor.as_ref().filter(|_| enabled)
    }

    /// Move players in `area` onto `plot` and despawn everything else there
    pub(crate) fn clear_entities(&self, plot: &Plot, area: &Region) {
        for entity in self.host.entities(plot.level()) {
            if !area.contains_location_xz(&entity.location) {
                continue;
            }
            if entity.is_player() {
                self.teleport_to(entity.id, plot, false);
            } else {
                self.host.despawn(entity.id);
            }
        }
    }
}
