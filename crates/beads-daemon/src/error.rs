// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("another daemon already holds the lock at {0}")]
    LockHeld(PathBuf),

    #[error("failed to bind socket at {path}: {source}")]
    BindFailed { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Storage(#[from] beads_storage::StorageError),

    #[error(transparent)]
    Protocol(#[from] beads_wire::ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
