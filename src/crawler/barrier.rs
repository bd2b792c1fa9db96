//! Completion barrier for one breadth-first level
//!
//! The number of tasks belonging to a level is not known upfront: every
//! successful download may register one more extraction task while other
//! tasks are already deregistering. The barrier is therefore a
//! dynamically-registered outstanding-work tally, not a fixed-size barrier.
//!
//! The counter is seeded at 1 for the orchestrator itself, so the level
//! cannot drain to zero before any work has been registered.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Dynamic-registration barrier coordinating one traversal level
pub struct LevelBarrier {
    outstanding: AtomicUsize,
    drained: Notify,
}

impl LevelBarrier {
    /// Creates a barrier seeded with the orchestrator's own registration
    pub fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(1),
            drained: Notify::new(),
        }
    }

    /// Registers one task whose completion the level must await
    ///
    /// Must be called before the task is observably startable; a task that
    /// could finish before its registration is visible could drain the
    /// counter to zero prematurely.
    pub fn register(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Marks one registered task as finished
    ///
    /// Called exactly once per registration. The task that drops the counter
    /// to zero wakes the orchestrator blocked in [`LevelBarrier::await_level`].
    pub fn arrive(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_one();
        }
    }

    /// Blocks until every registered task for the current level has arrived
    ///
    /// Performs the orchestrator's own arrival first (matching the count of
    /// 1 seeded at level start), then suspends until the counter drains.
    /// On return the barrier is reset to a fresh state for the next level.
    pub async fn await_level(&self) {
        self.arrive();
        loop {
            // Register interest before checking, so an arrival between the
            // check and the await leaves a wakeup permit behind.
            let notified = self.drained.notified();
            if self.outstanding.load(Ordering::Acquire) == 0 {
                break;
            }
            notified.await;
        }
        self.outstanding.store(1, Ordering::Release);
    }
}

impl Default for LevelBarrier {
    fn default() -> Self {
        Self::new()
    }
}
