// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync orchestrator (spec.md §4.5): coordinates one sync cycle
//! across the merge engine, the sync-branch worktree (when configured),
//! and sync-state/backoff bookkeeping.

use std::path::PathBuf;

use beads_core::Clock;
use beads_storage::{Filter, Store};
use tracing::{info, warn};

use crate::conflicts::ConflictStore;
use crate::error::SyncError;
use crate::git;
use crate::lock::SyncLock;
use crate::paths::WorkspacePaths;
use crate::state::SyncStateStore;
use crate::worktree::WorktreeManager;

#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    pub conflict_count: usize,
    pub pushed: bool,
    pub warnings: Vec<String>,
}

pub struct SyncOrchestrator<C: Clock> {
    pub paths: WorkspacePaths,
    pub repo_root: PathBuf,
    pub sync_branch: Option<String>,
    pub suppress_push: bool,
    pub clock: C,
}

impl<C: Clock> SyncOrchestrator<C> {
    /// The full pull-first protocol (spec.md §4.5 steps 1-13).
    pub async fn full(&self, store: &Store) -> Result<SyncReport, SyncError> {
        self.check_preconditions().await?;

        let state_store = SyncStateStore::new(&self.paths.sync_state_path);
        let now = self.clock.now();
        if state_store.should_skip(now)? {
            let state = state_store.load(now)?;
            return Err(SyncError::Backoff {
                reason: state.failure_reason.unwrap_or_default(),
                until: state.backoff_until.unwrap_or(now),
            });
        }
        let state = state_store.load(now)?;
        if state.needs_manual_sync {
            return Err(SyncError::NeedsManualSync);
        }

        match self.run_full_inner(store).await {
            Ok(report) => {
                state_store.record_success()?;
                Ok(report)
            }
            Err(e) => {
                let _ = state_store.record_failure(&e.to_string(), self.clock.now());
                Err(e)
            }
        }
    }

    async fn run_full_inner(&self, store: &Store) -> Result<SyncReport, SyncError> {
        let _lock = SyncLock::acquire(&self.paths.sync_lock_path)?;
        let now = self.clock.now();

        // 1. Snapshot local (including tombstones).
        let local = store.read(|tx| tx.search_issues(&Filter { include_tombstones: true, ..Default::default() }, now))?;

        // 3. Load base state (may be absent on first sync).
        let base = if self.paths.sync_base_path.exists() {
            Some(beads_storage::jsonl::import(&self.paths.sync_base_path)?)
        } else {
            None
        };

        // 4. Pull remote.
        let mut warnings = Vec::new();
        let worktree = match &self.sync_branch {
            Some(branch) => {
                let manager = WorktreeManager::new(&self.repo_root, branch.clone())?;
                manager.ensure_exists().await?;
                let outcome = manager.pull().await?;
                if let Some(warning) = outcome.safety_warning {
                    warnings.push(warning);
                }
                Some(manager)
            }
            None => {
                let _ = git::git(&["pull", "--ff-only"], &self.repo_root, git::PUSH_TIMEOUT).await;
                None
            }
        };

        // 5. Load remote by parsing the post-pull JSONL.
        let remote_jsonl_path = match &worktree {
            Some(manager) => manager.worktree_path().join(relative_beads_dir(&self.repo_root, &self.paths.beads_dir)).join("issues.jsonl"),
            None => self.paths.issues_jsonl_path.clone(),
        };
        let remote = if remote_jsonl_path.exists() { beads_storage::jsonl::import(&remote_jsonl_path)? } else { Vec::new() };

        // 6. Merge.
        let result = beads_merge::merge(base.as_deref(), &local, &remote);
        if result.conflict_count > 0 {
            let conflict_store = ConflictStore::new(&self.paths.sync_conflicts_path);
            conflict_store.record(&local, &remote, &result.issues)?;
            warnings.push(format!("{} issue(s) had conflicting edits; recorded for `bd sync --resolve`", result.conflict_count));
        }
        let mut merged_issues: Vec<_> = result.issues.into_iter().map(|m| m.issue).collect();

        // 7. Write merged JSONL atomically.
        beads_storage::jsonl::export_atomic(&self.paths.issues_jsonl_path, &mut merged_issues)?;

        // 8. Import merged JSONL into storage.
        store.run_in_transaction(|tx| {
            for issue in &merged_issues {
                tx.replace_issue(issue)?;
            }
            Ok(())
        })?;

        // 9. Re-export canonical JSONL from storage.
        let mut canonical = store.read(|tx| tx.search_issues(&Filter { include_tombstones: true, ..Default::default() }, now))?;
        beads_storage::jsonl::export_atomic(&self.paths.issues_jsonl_path, &mut canonical)?;

        // 10. Commit and push.
        let pushed = self.commit_and_push(&worktree).await?;

        // 11. Update base state to the freshly re-exported JSONL.
        std::fs::copy(&self.paths.issues_jsonl_path, &self.paths.sync_base_path)?;

        // 12 & 13: clear sync-state (done by the caller on success), release lock (drop).
        info!(conflicts = result.conflict_count, pushed, "sync completed");
        Ok(SyncReport { conflict_count: result.conflict_count, pushed, warnings })
    }

    /// `--no-pull`: steps 2, 9, 10, 12, 13 -- export current storage
    /// state and commit/push it without merging anything in.
    pub async fn export_only(&self, store: &Store) -> Result<SyncReport, SyncError> {
        self.check_preconditions().await?;
        let _lock = SyncLock::acquire(&self.paths.sync_lock_path)?;
        let now = self.clock.now();

        let mut issues = store.read(|tx| tx.search_issues(&Filter { include_tombstones: true, ..Default::default() }, now))?;
        beads_storage::jsonl::export_atomic(&self.paths.issues_jsonl_path, &mut issues)?;

        let worktree = match &self.sync_branch {
            Some(branch) => {
                let manager = WorktreeManager::new(&self.repo_root, branch.clone())?;
                manager.ensure_exists().await?;
                Some(manager)
            }
            None => None,
        };
        let pushed = self.commit_and_push(&worktree).await?;

        let state_store = SyncStateStore::new(&self.paths.sync_state_path);
        state_store.record_success()?;
        Ok(SyncReport { conflict_count: 0, pushed, warnings: Vec::new() })
    }

    /// Step 8 only: upserts `issues.jsonl` straight into storage,
    /// bypassing pull, merge, commit, and push entirely.
    pub fn import_only(&self, store: &Store) -> Result<SyncReport, SyncError> {
        let issues = beads_storage::jsonl::import(&self.paths.issues_jsonl_path)?;
        store.run_in_transaction(|tx| {
            for issue in &issues {
                tx.replace_issue(issue)?;
            }
            Ok(())
        })?;
        Ok(SyncReport::default())
    }

    /// Flush/squash: write the canonical JSONL without committing.
    pub fn flush_only(&self, store: &Store) -> Result<(), SyncError> {
        let now = self.clock.now();
        let mut issues = store.read(|tx| tx.search_issues(&Filter { include_tombstones: true, ..Default::default() }, now))?;
        beads_storage::jsonl::export_atomic(&self.paths.issues_jsonl_path, &mut issues)?;
        Ok(())
    }

    /// One-way import when the working branch has no upstream: treats
    /// the on-disk `issues.jsonl` as authoritative without attempting a
    /// push.
    pub fn from_main(&self, store: &Store) -> Result<SyncReport, SyncError> {
        self.import_only(store)
    }

    async fn commit_and_push(&self, worktree: &Option<WorktreeManager>) -> Result<bool, SyncError> {
        let beads_relpath = relative_beads_dir(&self.repo_root, &self.paths.beads_dir);
        match worktree {
            Some(manager) => {
                manager.sync_path_into_worktree(&beads_relpath)?;
                let committed = manager.commit_beads_subtree(&beads_relpath, "beads-sync: update issues").await?;
                if committed && !self.suppress_push {
                    manager.push().await?;
                    return Ok(true);
                }
                Ok(false)
            }
            None => {
                let relpath = beads_relpath.display().to_string();
                git::git(&["add", &relpath], &self.repo_root, git::WORKTREE_TIMEOUT).await?;
                let status = git::git(&["status", "--porcelain", "--", &relpath], &self.repo_root, git::WORKTREE_TIMEOUT).await?;
                if status.is_empty() {
                    return Ok(false);
                }
                git::git(&["commit", "-m", "beads-sync: update issues", "--", &relpath], &self.repo_root, git::WORKTREE_TIMEOUT).await?;
                if self.suppress_push {
                    return Ok(false);
                }
                if git::git(&["push"], &self.repo_root, git::PUSH_TIMEOUT).await.is_err() {
                    warn!("push failed or no upstream configured; beads files committed locally");
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }

    async fn check_preconditions(&self) -> Result<(), SyncError> {
        if git::has_in_progress_merge(&self.repo_root).await {
            return Err(SyncError::GitCommandFailed { code: None, stderr: "a merge or rebase is already in progress".into() });
        }
        if let Some(branch) = &self.sync_branch {
            let current = git::current_branch(&self.repo_root).await;
            if matches!(current.as_deref(), Ok(b) if b == branch.as_str()) {
                return Err(SyncError::GitCommandFailed {
                    code: None,
                    stderr: format!("cannot sync while checked out on the sync branch '{branch}'"),
                });
            }
        }
        Ok(())
    }
}

fn relative_beads_dir(repo_root: &std::path::Path, beads_dir: &std::path::Path) -> PathBuf {
    beads_dir.strip_prefix(repo_root).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(".beads"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::{FakeClock, Issue};
    use chrono::Utc;
    use tempfile::tempdir;

    async fn init_repo(dir: &std::path::Path) {
        for args in [vec!["init", "-q"], vec!["config", "user.email", "a@b.c"], vec!["config", "user.name", "t"]] {
            let args: Vec<&str> = args;
            git::git(&args, dir, git::WORKTREE_TIMEOUT).await.unwrap();
        }
        std::fs::write(dir.join("README.md"), "x").unwrap();
        git::git(&["add", "."], dir, git::WORKTREE_TIMEOUT).await.unwrap();
        git::git(&["commit", "-q", "-m", "init"], dir, git::WORKTREE_TIMEOUT).await.unwrap();
    }

    fn orchestrator(repo: &std::path::Path) -> SyncOrchestrator<FakeClock> {
        let beads_dir = repo.join(".beads");
        std::fs::create_dir_all(&beads_dir).unwrap();
        SyncOrchestrator {
            paths: WorkspacePaths::for_workspace(&beads_dir),
            repo_root: repo.to_path_buf(),
            sync_branch: None,
            suppress_push: true,
            clock: FakeClock::new(Utc::now()),
        }
    }

    #[tokio::test]
    async fn full_sync_with_no_remote_history_commits_local_export() {
        let dir = tempdir().unwrap();
        init_repo(dir.path()).await;
        let orch = orchestrator(dir.path());
        let store = Store::open(&orch.paths.db_path).unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "t", Utc::now()), "a", "bd")).unwrap();
        // Seed issues.jsonl so dispatch-style export semantics are visible to the sync step.
        let mut issues = store.read(|tx| tx.search_issues(&Filter::default(), Utc::now())).unwrap();
        beads_storage::jsonl::export_atomic(&orch.paths.issues_jsonl_path, &mut issues).unwrap();

        let report = orch.full(&store).await.unwrap();
        assert_eq!(report.conflict_count, 0);
        assert!(orch.paths.sync_base_path.exists());
    }

    #[test]
    fn import_only_upserts_jsonl_into_storage() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut issues = vec![Issue::new("bd-1", "from jsonl", Utc::now())];
        beads_storage::jsonl::export_atomic(&orch.paths.issues_jsonl_path, &mut issues).unwrap();

        orch.import_only(&store).unwrap();
        let fetched = store.read(|tx| tx.get_issue("bd-1")).unwrap().unwrap();
        assert_eq!(fetched.title, "from jsonl");
    }

    #[test]
    fn flush_only_writes_jsonl_without_touching_git() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path());
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "t", Utc::now()), "a", "bd")).unwrap();
        orch.flush_only(&store).unwrap();
        assert!(orch.paths.issues_jsonl_path.exists());
    }
}
