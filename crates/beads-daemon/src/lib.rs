// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! beads-daemon: the per-workspace daemon process (spec.md §4.2) --
//! lifecycle, RPC listener, mutation event bus, deferred export
//! debouncer, filesystem watcher, and daemon discovery.

pub mod config;
pub mod debounce;
pub mod discovery;
mod dispatch;
pub mod error;
pub mod event_bus;
pub mod lifecycle;
pub mod listener;
mod sqlite_update;
pub mod watcher;

pub use config::Config;
pub use error::DaemonError;
pub use lifecycle::{startup, DaemonState, StartupResult};

use std::sync::Arc;

use tracing::info;

/// Runs one workspace daemon to completion: starts it, serves requests
/// until a `shutdown` RPC or external cancellation arrives, then tears
/// down cleanly.
pub async fn run(config: Config) -> Result<(), DaemonError> {
    let StartupResult { daemon, listener } = startup(config).await?;
    let cancel = daemon.shutdown.clone();

    listener::run(listener, Arc::clone(&daemon), cancel).await;
    daemon.shutdown().await;
    info!("daemon exited");
    Ok(())
}
