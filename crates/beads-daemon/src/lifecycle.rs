// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown (spec.md §4.2). Grounded on the teacher's
//! `lifecycle::startup` lock-file-first sequencing: the PID/lock file is
//! acquired before any other filesystem mutation, so a losing process
//! never tears down files belonging to the daemon that won the race.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use beads_storage::Store;
use fs2::FileExt;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::DaemonError;
use crate::event_bus::EventBus;

/// Everything a running daemon needs, shared across the listener's
/// per-connection tasks.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub store: Arc<Store>,
    pub event_bus: EventBus,
    pub debouncer: Arc<Debouncer>,
    pub start_time: Instant,
    pub sync_paused: Arc<AtomicBool>,
    pub shutdown: CancellationToken,
}

pub struct StartupResult {
    pub daemon: Arc<DaemonState>,
    pub listener: UnixListener,
}

/// Starts the daemon for one workspace: acquires the single-instance
/// lock, opens storage, and binds the socket. Only the socket bind
/// happens last (spec.md §4.2: "validate single-instance ... open
/// storage ... begin accepting connections").
pub async fn startup(config: Config) -> Result<StartupResult, DaemonError> {
    std::fs::create_dir_all(&config.beads_dir)?;

    let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(|_| DaemonError::LockHeld(config.lock_path.clone()))?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    let store = Store::open(&config.db_path)?;

    if config.socket_path.exists() {
        clean_up_stale_socket(&config.socket_path);
    }
    let listener = UnixListener::bind(&config.socket_path).map_err(|source| DaemonError::BindFailed { path: config.socket_path.clone(), source })?;

    let daemon = Arc::new(DaemonState {
        store: Arc::new(store),
        event_bus: EventBus::new(),
        debouncer: Arc::new(Debouncer::new(config.debounce_quiet_period)),
        start_time: Instant::now(),
        sync_paused: Arc::new(AtomicBool::new(false)),
        shutdown: CancellationToken::new(),
        lock_file,
        config,
    });

    info!(socket = %daemon.config.socket_path.display(), "daemon started");
    Ok(StartupResult { daemon, listener })
}

/// A socket file with no live holder is left behind by a process that
/// crashed before `shutdown` ran; removing it is safe because we already
/// hold the workspace's exclusive lock file.
fn clean_up_stale_socket(path: &std::path::Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove stale socket");
    }
}

impl DaemonState {
    /// Graceful shutdown: flush any deferred export, remove the socket,
    /// release the lock file (dropped by the caller after this returns).
    pub async fn shutdown(&self) {
        info!("daemon shutting down");
        self.debouncer.cancel();
        if self.store.integrity_check().is_err() {
            warn!("integrity check failed during shutdown; leaving beads.db for `doctor` to inspect");
        }
        let _ = std::fs::remove_file(&self.config.socket_path);
    }
}

/// `killall`'s three-stage escalation (spec.md §4.2/§5): RPC shutdown (2s)
/// then a polite signal (3s) then a force-kill (1s). The daemon process
/// itself only implements the RPC leg; the outer two legs are the CLI's
/// responsibility acting on the PID recorded in the lock file, mirrored
/// here as named constants so both sides agree on timing.
pub const RPC_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
pub const SIGNAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);
pub const FORCE_KILL_TIMEOUT: Duration = Duration::from_secs(1);

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn startup_binds_socket_and_writes_pid() {
        let dir = tempdir().unwrap();
        let config = Config::for_workspace(dir.path(), "bd");
        let result = startup(config.clone()).await.unwrap();
        assert!(config.socket_path.exists());

        let pid = std::fs::read_to_string(&config.lock_path).unwrap();
        assert_eq!(pid.trim(), std::process::id().to_string());

        result.daemon.shutdown().await;
        assert!(!config.socket_path.exists());
    }

    #[tokio::test]
    async fn second_startup_against_the_same_workspace_fails_the_lock() {
        let dir = tempdir().unwrap();
        let config = Config::for_workspace(dir.path(), "bd");
        let first = startup(config.clone()).await.unwrap();

        let err = startup(config.clone()).await;
        assert!(matches!(err, Err(DaemonError::LockHeld(_))));

        first.daemon.shutdown().await;
    }
}
