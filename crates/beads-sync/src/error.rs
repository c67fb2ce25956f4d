// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("another sync is already in progress for this workspace ({0})")]
    LockHeld(PathBuf),

    #[error("sync is paused by {reason} until {until}")]
    Backoff { reason: String, until: chrono::DateTime<chrono::Utc> },

    #[error("this workspace needs a manual sync (`bd sync --resolve`) before syncing again")]
    NeedsManualSync,

    #[error("git command failed (exit code {code:?}): {stderr}")]
    GitCommandFailed { code: Option<i32>, stderr: String },

    #[error(transparent)]
    Storage(#[from] beads_storage::StorageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("sync timed out waiting for {operation}")]
    Timeout { operation: String },
}
