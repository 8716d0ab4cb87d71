//! # Plotworld Engine
//!
//! Runtime side of the plot manager: a non-blocking plot cache, merge and
//! settings operations guarded by hooks, and world edits that run either
//! through a bulk editor or as rate-limited tick tasks.

pub mod cache;
pub mod capability;
pub mod config;
pub mod edits;
pub mod hooks;
pub mod manager;
pub mod memory;
pub mod merge;
pub mod pipeline;
pub mod placement;
pub mod scheduler;

pub use cache::{CachedPlot, PlotCache};
pub use capability::{
    Economy, EditReport, Entity, EntityId, EntityKind, PlotStore, Scheduler, TickStatus, TickTask,
    WorldEditor, WorldHost,
};
pub use config::{EngineConfig, DEFAULT_CONFIG_NAME};
pub use edits::{EditPlan, EditStep, ScheduledEdit};
pub use hooks::{Cancellable, Hook, HookBus};
pub use manager::{PlotManager, PlotManagerBuilder};
pub use memory::MemoryPlotStore;
pub use scheduler::{spawn_ticker, TickScheduler};
