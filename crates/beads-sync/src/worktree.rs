// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync-branch worktree (spec.md §4.6): an auxiliary checkout of the
//! configured sync branch, kept separate from the main working branch so
//! beads commits never land there while sync-branch mode is active.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::SyncError;
use crate::git::{git, WORKTREE_TIMEOUT};

const BEADS_PATHSPEC: &str = "--";

pub struct WorktreeManager {
    repo_root: PathBuf,
    worktree_path: PathBuf,
    branch: String,
}

/// Outcome of pulling the sync branch's worktree up to date.
pub struct PullOutcome {
    pub merged: bool,
    pub safety_warning: Option<String>,
}

impl WorktreeManager {
    /// `repo_root` is the main checkout; the worktree lives under the
    /// repository's common git dir so it survives outside the working
    /// tree the operator sees day to day.
    pub fn new(repo_root: impl Into<PathBuf>, branch: impl Into<String>) -> Result<Self, SyncError> {
        let repo_root = repo_root.into();
        let worktree_path = repo_root.join(".git").join("beads-sync-worktree");
        Ok(Self { repo_root, worktree_path, branch: branch.into() })
    }

    pub fn worktree_path(&self) -> &Path {
        &self.worktree_path
    }

    /// Create-if-absent: registers the worktree checked out onto the
    /// sync branch, creating the branch from the current `HEAD` if it
    /// does not exist yet anywhere in the repository.
    pub async fn ensure_exists(&self) -> Result<(), SyncError> {
        if self.worktree_path.exists() {
            return Ok(());
        }

        let branch_exists = git(
            &["show-ref", "--verify", "--quiet", &format!("refs/heads/{}", self.branch)],
            &self.repo_root,
            WORKTREE_TIMEOUT,
        )
        .await
        .is_ok();

        let path_str = self.worktree_path.display().to_string();
        if branch_exists {
            git(&["worktree", "add", &path_str, &self.branch], &self.repo_root, WORKTREE_TIMEOUT).await?;
        } else {
            git(&["worktree", "add", "-b", &self.branch, &path_str], &self.repo_root, WORKTREE_TIMEOUT).await?;
        }
        Ok(())
    }

    /// Copies `<beads>` from the main checkout into the worktree's
    /// mirrored path, so the worktree's working directory matches what
    /// will be committed.
    pub fn sync_path_into_worktree(&self, beads_relpath: &Path) -> Result<(), SyncError> {
        let source = self.repo_root.join(beads_relpath);
        let dest = self.worktree_path.join(beads_relpath);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        copy_dir_recursive(&source, &dest)
    }

    /// Fetches and fast-forwards (or merges, emitting a safety warning on
    /// divergence) the worktree onto the upstream sync branch.
    pub async fn pull(&self) -> Result<PullOutcome, SyncError> {
        let remote_ref = format!("origin/{}", self.branch);
        if git(&["fetch", "origin", &self.branch], &self.worktree_path, WORKTREE_TIMEOUT).await.is_err() {
            // No configured remote, or the branch doesn't exist upstream yet: nothing to pull.
            return Ok(PullOutcome { merged: false, safety_warning: None });
        }

        let ff_result = git(&["merge", "--ff-only", &remote_ref], &self.worktree_path, WORKTREE_TIMEOUT).await;
        match ff_result {
            Ok(_) => Ok(PullOutcome { merged: false, safety_warning: None }),
            Err(_) => {
                git(&["merge", &remote_ref, "-m", "beads-sync: merge diverged sync branch"], &self.worktree_path, WORKTREE_TIMEOUT)
                    .await?;
                let warning = format!("sync branch '{}' diverged upstream; merged automatically", self.branch);
                warn!(branch = %self.branch, "sync branch diverged, merged");
                Ok(PullOutcome { merged: true, safety_warning: Some(warning) })
            }
        }
    }

    /// Commits only the beads subtree inside the worktree, using a
    /// pathspec so unrelated staged files in the worktree are untouched.
    pub async fn commit_beads_subtree(&self, beads_relpath: &Path, message: &str) -> Result<bool, SyncError> {
        let relpath = beads_relpath.display().to_string();
        git(&["add", &relpath], &self.worktree_path, WORKTREE_TIMEOUT).await?;

        let status = git(&["status", "--porcelain", BEADS_PATHSPEC, &relpath], &self.worktree_path, WORKTREE_TIMEOUT).await?;
        if status.is_empty() {
            return Ok(false);
        }

        git(&["commit", "-m", message, BEADS_PATHSPEC, &relpath], &self.worktree_path, WORKTREE_TIMEOUT).await?;
        Ok(true)
    }

    pub async fn push(&self) -> Result<(), SyncError> {
        git(&["push", "origin", &self.branch], &self.worktree_path, crate::git::PUSH_TIMEOUT).await?;
        Ok(())
    }
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<(), SyncError> {
    if !source.exists() {
        return Ok(());
    }
    if source.is_dir() {
        std::fs::create_dir_all(dest)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            copy_dir_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(source, dest)?;
    }
    Ok(())
}
