// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workspace sync lock (spec.md §5: "an OS-level file lock ensures
//! at most one orchestrator per workspace, even across processes").
//! Grounded on `beads-daemon::lifecycle`'s identical use of
//! `fs2::FileExt::try_lock_exclusive` for the daemon's own PID lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::SyncError;

/// Held for the lifetime of one sync cycle; dropping it releases the
/// lock (fs2 locks are released on file close).
pub struct SyncLock {
    _file: File,
    path: PathBuf,
}

impl SyncLock {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&path)?;
        file.try_lock_exclusive().map_err(|_| SyncError::LockHeld(path.clone()))?;
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_acquire_fails_while_first_is_held() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".sync.lock");
        let first = SyncLock::acquire(&lock_path).unwrap();
        let second = SyncLock::acquire(&lock_path);
        assert!(matches!(second, Err(SyncError::LockHeld(_))));
        drop(first);
        assert!(SyncLock::acquire(&lock_path).is_ok());
    }
}
