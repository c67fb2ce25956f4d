// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace paths the orchestrator touches (spec.md §6.1), mirroring
//! `beads-daemon::Config`'s fixed-filenames-under-one-root layout
//! without introducing a dependency on the daemon crate.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub beads_dir: PathBuf,
    pub db_path: PathBuf,
    pub issues_jsonl_path: PathBuf,
    pub sync_base_path: PathBuf,
    pub sync_state_path: PathBuf,
    pub sync_conflicts_path: PathBuf,
    pub sync_lock_path: PathBuf,
    pub redirect_path: PathBuf,
}

impl WorkspacePaths {
    pub fn for_workspace(beads_dir: impl AsRef<Path>) -> Self {
        let beads_dir = beads_dir.as_ref().to_path_buf();
        Self {
            db_path: beads_dir.join("beads.db"),
            issues_jsonl_path: beads_dir.join("issues.jsonl"),
            sync_base_path: beads_dir.join("sync_base.jsonl"),
            sync_state_path: beads_dir.join("sync-state.json"),
            sync_conflicts_path: beads_dir.join("sync_conflicts.json"),
            sync_lock_path: beads_dir.join(".sync.lock"),
            redirect_path: beads_dir.join("redirect"),
            beads_dir,
        }
    }

    /// Follows `redirect` (spec.md §4.9) to the workspace that actually
    /// owns version control, when present and pointing at a real
    /// directory.
    pub fn resolve_redirect(&self) -> WorkspacePaths {
        match std::fs::read_to_string(&self.redirect_path) {
            Ok(target) if Path::new(target.trim()).is_dir() => WorkspacePaths::for_workspace(target.trim()),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn redirect_file_rewrites_the_resolved_dir() {
        let real = tempdir().unwrap();
        let alias = tempdir().unwrap();
        std::fs::write(alias.path().join("redirect"), real.path().to_string_lossy().as_bytes()).unwrap();

        let paths = WorkspacePaths::for_workspace(alias.path()).resolve_redirect();
        assert_eq!(paths.beads_dir, real.path());
    }

    #[test]
    fn no_redirect_file_resolves_to_self() {
        let dir = tempdir().unwrap();
        let paths = WorkspacePaths::for_workspace(dir.path()).resolve_redirect();
        assert_eq!(paths.beads_dir, dir.path());
    }
}
