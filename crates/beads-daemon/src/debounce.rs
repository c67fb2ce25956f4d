// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred export debouncer (spec.md §4.7): writes mark the workspace
//! dirty; a timer is (re)set on each mark for a configurable quiet
//! period, and a single export runs when the timer fires. A monotonic
//! sequence counter invalidates stale timer fires after cancel/retrigger,
//! and the fired action always runs with the debouncer's own lock
//! released, matching spec.md §5's deadlock-avoidance requirement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

struct State {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Coalesces bursts of dirty-marks into a single delayed action.
pub struct Debouncer {
    quiet_period: Duration,
    state: Mutex<State>,
    fired_generation: AtomicU64,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            state: Mutex::new(State { generation: 0, handle: None }),
            fired_generation: AtomicU64::new(0),
        }
    }

    /// (Re)arms the timer. Any previously scheduled fire for an earlier
    /// generation becomes a no-op when it wakes, because the generation
    /// it captured no longer matches.
    pub fn trigger<F>(self: &Arc<Self>, action: F)
    where
        F: Fn() + Send + 'static,
    {
        let mut state = self.state.lock();
        state.generation += 1;
        let my_generation = state.generation;

        if let Some(old) = state.handle.take() {
            old.abort();
        }

        let this = Arc::clone(self);
        let quiet_period = self.quiet_period;
        state.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let current = this.state.lock().generation;
            if current != my_generation {
                return;
            }
            this.fired_generation.store(my_generation, Ordering::SeqCst);
            action();
        }));
    }

    /// Cancels any pending fire. Idempotent: cancelling an already-idle
    /// debouncer is a no-op.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(handle) = state.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn fired_generation(&self) -> u64 {
        self.fired_generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn fires_once_after_quiet_period() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(20)));
        let fires = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fires);
        debouncer.trigger(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retrigger_before_fire_resets_the_timer() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(30)));
        let fires = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&fires);
            debouncer.trigger(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_suppresses_pending_fire() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(10)));
        let fires = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fires);
        debouncer.trigger(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 0);
        assert_eq!(debouncer.fired_generation(), 0);
    }
}
