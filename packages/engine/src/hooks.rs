//! # Hook Bus
//!
//! Synchronous extension points consulted before every state-changing
//! operation.
//!
//! ## Design
//!
//! Each event kind has its own ordered listener list. Dispatch hands every
//! listener, in registration order, a `&mut` to the same event value:
//! - **Veto**: a listener on a cancellable event may set `cancelled`
//! - **Rewrite**: some events expose a replaceable `plot`
//! - **Pre-cancel**: the engine may dispatch an event already cancelled
//!   (e.g. a no-op change); listeners can still un-cancel it
//!
//! Listeners run on the caller's thread and must not register new listeners
//! on the same hook from inside a dispatch.

use crate::capability::EntityId;
use plotworld_grid::{BlockId, Facing, MergedPlot, Plot};
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Event that listeners may veto
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}

macro_rules! cancellable {
    ($($event:ty),* $(,)?) => {
        $(
            impl Cancellable for $event {
                fn is_cancelled(&self) -> bool {
                    self.cancelled
                }

                fn set_cancelled(&mut self, cancelled: bool) {
                    self.cancelled = cancelled;
                }
            }
        )*
    };
}

type Listener<E> = Box<dyn Fn(&mut E) + Send + Sync>;

/// Ordered listener list for one event kind
pub struct Hook<E> {
    listeners: RwLock<Vec<Listener<E>>>,
}

impl<E> Default for Hook<E> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for Hook<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> Hook<E> {
    pub fn listen(&self, listener: impl Fn(&mut E) + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    pub fn dispatch(&self, event: &mut E) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A settings change: `original` is read-only, `plot` is what will be saved
#[derive(Debug, Clone)]
pub struct SettingEvent {
    original: Plot,
    pub plot: Plot,
    cancelled: bool,
}

impl SettingEvent {
    pub fn new(original: Plot, plot: Plot) -> Self {
        Self {
            original,
            plot,
            cancelled: false,
        }
    }

    pub fn original(&self) -> &Plot {
        &self.original
    }
}

/// A proposed merge. Read-only apart from cancellation.
#[derive(Debug, Clone)]
pub struct MergeEvent {
    plot: MergedPlot,
    direction: Facing,
    absorbed: Vec<Plot>,
    cancelled: bool,
}

impl MergeEvent {
    pub fn new(plot: MergedPlot, direction: Facing, absorbed: Vec<Plot>) -> Self {
        Self {
            plot,
            direction,
            absorbed,
            cancelled: false,
        }
    }

    /// The union as it would be persisted
    pub fn plot(&self) -> &MergedPlot {
        &self.plot
    }

    pub fn direction(&self) -> Facing {
        self.direction
    }

    pub fn absorbed(&self) -> &[Plot] {
        &self.absorbed
    }

    pub fn into_parts(self) -> (MergedPlot, Vec<Plot>) {
        (self.plot, self.absorbed)
    }
}

#[derive(Debug, Clone)]
pub struct TeleportEvent {
    pub plot: Plot,
    entity: EntityId,
    pub centered: bool,
    cancelled: bool,
}

impl TeleportEvent {
    pub fn new(plot: Plot, entity: EntityId, centered: bool) -> Self {
        Self {
            plot,
            entity,
            centered,
            cancelled: false,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

/// Both the plot and the edit rate may be replaced by listeners
#[derive(Debug, Clone)]
pub struct ClearEvent {
    pub plot: Plot,
    pub max_blocks_per_tick: u32,
    cancelled: bool,
}

impl ClearEvent {
    pub fn new(plot: Plot, max_blocks_per_tick: u32) -> Self {
        Self {
            plot,
            max_blocks_per_tick,
            cancelled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FillEvent {
    pub plot: Plot,
    pub block: BlockId,
    pub max_blocks_per_tick: u32,
    cancelled: bool,
}

impl FillEvent {
    pub fn new(plot: Plot, block: BlockId, max_blocks_per_tick: u32) -> Self {
        Self {
            plot,
            block,
            max_blocks_per_tick,
            cancelled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisposeEvent {
    pub plot: Plot,
    cancelled: bool,
}

impl DisposeEvent {
    pub fn new(plot: Plot) -> Self {
        Self {
            plot,
            cancelled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResetEvent {
    pub plot: Plot,
    cancelled: bool,
}

impl ResetEvent {
    pub fn new(plot: Plot) -> Self {
        Self {
            plot,
            cancelled: false,
        }
    }
}

/// Fired before every save. Not cancellable; listeners may replace `plot`.
#[derive(Debug, Clone)]
pub struct SaveEvent {
    pub plot: Plot,
}

impl SaveEvent {
    pub fn new(plot: Plot) -> Self {
        Self { plot }
    }
}

#[derive(Debug, Clone)]
pub struct CloneEvent {
    pub from: Plot,
    pub to: Plot,
    cancelled: bool,
}

impl CloneEvent {
    pub fn new(from: Plot, to: Plot) -> Self {
        Self {
            from,
            to,
            cancelled: false,
        }
    }
}

cancellable!(
    SettingEvent,
    MergeEvent,
    TeleportEvent,
    ClearEvent,
    FillEvent,
    DisposeEvent,
    ResetEvent,
    CloneEvent,
);

/// One hook per event kind
#[derive(Debug, Default)]
pub struct HookBus {
    pub setting: Hook<SettingEvent>,
    pub merge: Hook<MergeEvent>,
    pub teleport: Hook<TeleportEvent>,
    pub clear: Hook<ClearEvent>,
    pub fill: Hook<FillEvent>,
    pub dispose: Hook<DisposeEvent>,
    pub reset: Hook<ResetEvent>,
    pub save: Hook<SaveEvent>,
    pub clone: Hook<CloneEvent>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }
}
