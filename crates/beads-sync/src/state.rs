// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync-state persistence and backoff (spec.md §4.8). `sync-state.json`
//! is guarded by a process-wide mutex across the load-modify-save cycle,
//! the same shape as the daemon's other small JSON side-files.

use std::path::{Path, PathBuf};

use beads_core::sync_state::SyncState;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::error::SyncError;

/// `{30s, 1m, 2m, 5m, 10m, 30m}`, clamped at the tail (spec.md §4.8).
const BACKOFF_SCHEDULE_SECS: &[i64] = &[30, 60, 120, 300, 600, 1800];
const STALE_AFTER: Duration = Duration::hours(24);

pub struct SyncStateStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl SyncStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), guard: Mutex::new(()) }
    }

    /// Loads the record, dropping it if it is older than 24h (spec.md
    /// §4.8: "a stale record is dropped on load").
    pub fn load(&self, now: DateTime<Utc>) -> Result<SyncState, SyncError> {
        let _lock = self.guard.lock();
        load_unlocked(&self.path, now)
    }

    pub fn record_failure(&self, reason: &str, now: DateTime<Utc>) -> Result<SyncState, SyncError> {
        let _lock = self.guard.lock();
        let mut state = load_unlocked(&self.path, now)?;
        state.failure_count += 1;
        state.last_failure = Some(now);
        state.failure_reason = Some(reason.to_string());
        let backoff_secs = BACKOFF_SCHEDULE_SECS[(state.failure_count as usize - 1).min(BACKOFF_SCHEDULE_SECS.len() - 1)];
        state.backoff_until = Some(now + Duration::seconds(backoff_secs));
        if state.failure_count >= 3 {
            state.needs_manual_sync = true;
        }
        save_unlocked(&self.path, &state)?;
        Ok(state)
    }

    pub fn record_success(&self) -> Result<(), SyncError> {
        let _lock = self.guard.lock();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn should_skip(&self, now: DateTime<Utc>) -> Result<bool, SyncError> {
        let state = self.load(now)?;
        Ok(state.backoff_until.is_some_and(|until| now < until))
    }

    /// Zeroes the failure counter on daemon start but preserves
    /// `needs_manual_sync` (spec.md §4.8) so the operator-visible warning
    /// survives a daemon restart.
    pub fn reset_backoff_on_daemon_start(&self) -> Result<(), SyncError> {
        let _lock = self.guard.lock();
        let now = Utc::now();
        let mut state = load_unlocked(&self.path, now)?;
        state.failure_count = 0;
        state.backoff_until = None;
        save_unlocked(&self.path, &state)
    }
}

fn load_unlocked(path: &Path, now: DateTime<Utc>) -> Result<SyncState, SyncError> {
    if !path.exists() {
        return Ok(SyncState::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let state: SyncState = serde_json::from_str(&raw)?;
    if let Some(last_failure) = state.last_failure {
        if now - last_failure > STALE_AFTER {
            return Ok(SyncState::default());
        }
    }
    Ok(state)
}

fn save_unlocked(path: &Path, state: &SyncState) -> Result<(), SyncError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn three_failures_trigger_needs_manual_sync() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path().join("sync-state.json"));
        store.record_failure("push failed", now()).unwrap();
        store.record_failure("push failed", now()).unwrap();
        let state = store.record_failure("push failed", now()).unwrap();
        assert!(state.needs_manual_sync);
        assert_eq!(state.failure_count, 3);
    }

    #[test]
    fn should_skip_true_while_backed_off() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path().join("sync-state.json"));
        store.record_failure("push failed", now()).unwrap();
        assert!(store.should_skip(now()).unwrap());
        assert!(!store.should_skip(now() + Duration::minutes(1)).unwrap());
    }

    #[test]
    fn record_success_clears_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync-state.json");
        let store = SyncStateStore::new(&path);
        store.record_failure("push failed", now()).unwrap();
        assert!(path.exists());
        store.record_success().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn stale_record_is_dropped_on_load() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path().join("sync-state.json"));
        let old = now() - Duration::hours(25);
        store.record_failure("push failed", old).unwrap();
        let loaded = store.load(now()).unwrap();
        assert_eq!(loaded.failure_count, 0);
    }

    #[test]
    fn reset_backoff_preserves_needs_manual_sync() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path().join("sync-state.json"));
        store.record_failure("a", now()).unwrap();
        store.record_failure("a", now()).unwrap();
        store.record_failure("a", now()).unwrap();
        store.reset_backoff_on_daemon_start().unwrap();
        let state = store.load(now()).unwrap();
        assert_eq!(state.failure_count, 0);
        assert!(state.backoff_until.is_none());
        assert!(state.needs_manual_sync);
    }
}
