// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin `git` subprocess wrapper (spec.md §4.6). Grounded on the
//! teacher's worktree-management code, which always runs `git` through
//! `tokio::process::Command` under a timeout rather than blocking the
//! executor thread.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::SyncError;

pub const PUSH_TIMEOUT: Duration = Duration::from_secs(5);
pub const WORKTREE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `git <args>` in `cwd`, returning trimmed stdout on success.
pub async fn git(args: &[&str], cwd: &Path, timeout_after: Duration) -> Result<String, SyncError> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(cwd);

    let output = timeout(timeout_after, cmd.output())
        .await
        .map_err(|_| SyncError::Timeout { operation: format!("git {}", args.join(" ")) })??;

    if !output.status.success() {
        return Err(SyncError::GitCommandFailed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub async fn current_branch(cwd: &Path) -> Result<String, SyncError> {
    git(&["rev-parse", "--abbrev-ref", "HEAD"], cwd, WORKTREE_TIMEOUT).await
}

pub async fn has_in_progress_merge(cwd: &Path) -> bool {
    let git_dir = match git(&["rev-parse", "--git-dir"], cwd, WORKTREE_TIMEOUT).await {
        Ok(d) => d,
        Err(_) => return false,
    };
    Path::new(&git_dir).join("MERGE_HEAD").exists()
}

pub async fn is_inside_work_tree(cwd: &Path) -> bool {
    matches!(git(&["rev-parse", "--is-inside-work-tree"], cwd, WORKTREE_TIMEOUT).await.as_deref(), Ok("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn git_version_succeeds() {
        let out = git(&["--version"], Path::new("."), WORKTREE_TIMEOUT).await.unwrap();
        assert!(out.starts_with("git version"));
    }

    #[tokio::test]
    async fn unknown_subcommand_fails() {
        let err = git(&["not-a-real-subcommand"], Path::new("."), WORKTREE_TIMEOUT).await;
        assert!(matches!(err, Err(SyncError::GitCommandFailed { .. })));
    }
}
