//! Tick-driven task runner for hosts without their own scheduler.

use crate::capability::{Scheduler, TickStatus, TickTask};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
pub struct TickScheduler {
    tasks: Mutex<Vec<Box<dyn TickTask>>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn TickTask>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance every task once. Returns the number still pending.
    ///
    /// Tasks scheduled while the tick runs start on the next tick.
    pub fn run_tick(&self) -> usize {
        let running = std::mem::take(&mut *self.lock());
        let mut pending: Vec<Box<dyn TickTask>> = Vec::with_capacity(running.len());
        for mut task in running {
            if task.tick() == TickStatus::Pending {
                pending.push(task);
            }
        }

        let mut tasks = self.lock();
        pending.append(&mut tasks);
        *tasks = pending;
        tasks.len()
    }

    /// Tick until idle or `max_ticks` is reached. Returns the ticks run.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.pending() > 0 {
            self.run_tick();
            ticks += 1;
        }
        ticks
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }
}

impl Scheduler for TickScheduler {
    fn schedule(&self, task: Box<dyn TickTask>) {
        self.lock().push(task);
    }
}

/// Drive `scheduler` on the current runtime every `period`
pub fn spawn_ticker(scheduler: Arc<TickScheduler>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            scheduler.run_tick();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl TickTask for Countdown {
        fn tick(&mut self) -> TickStatus {
            self.0 = self.0.saturating_sub(1);
            if self.0 == 0 {
                TickStatus::Done
            } else {
                TickStatus::Pending
            }
        }
    }

    #[test]
    fn test_finished_tasks_are_dropped() {
        let scheduler = TickScheduler::new();
        scheduler.schedule(Box::new(Countdown(1)));
        scheduler.schedule(Box::new(Countdown(3)));

        assert_eq!(scheduler.run_tick(), 1);
        assert_eq!(scheduler.run_until_idle(10), 2);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_ticker_drains_tasks() {
        let scheduler = Arc::new(TickScheduler::new());
        scheduler.schedule(Box::new(Countdown(3)));
        let ticker = spawn_ticker(Arc::clone(&scheduler), Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(scheduler.pending(), 0);
        ticker.abort();
    }
}
