// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync-conflict persistence and resolution (spec.md §4.5: `bd sync
//! --resolve` with {newest, ours, theirs, manual}).

use std::path::{Path, PathBuf};

use beads_core::sync_state::{ConflictResolution, SyncConflict};
use beads_core::Issue;
use beads_merge::{MergeStrategy, MergedIssue};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConflictFile {
    conflicts: Vec<SyncConflict>,
}

pub struct ConflictStore {
    path: PathBuf,
}

impl ConflictStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Records every `Merged`-strategy issue as a pending conflict
    /// (spec.md §4.5: "when strategy for a given ID would lose one
    /// side's edits, the orchestrator records a sync-conflict entry").
    pub fn record(&self, local: &[Issue], remote: &[Issue], merged: &[MergedIssue]) -> Result<(), SyncError> {
        let mut conflicts = self.load()?;
        for m in merged.iter().filter(|m| m.strategy == MergeStrategy::Merged) {
            let local_version = local.iter().find(|i| i.id == m.issue.id).map(render).unwrap_or_default();
            let remote_version = remote.iter().find(|i| i.id == m.issue.id).map(render).unwrap_or_default();
            conflicts.retain(|c| c.issue_id != m.issue.id);
            conflicts.push(SyncConflict {
                issue_id: m.issue.id.clone(),
                reason: "both sides changed since the last sync".to_string(),
                local_version,
                remote_version,
                resolved_strategy: None,
            });
        }
        self.save(&conflicts)
    }

    pub fn load(&self) -> Result<Vec<SyncConflict>, SyncError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let file: ConflictFile = serde_json::from_str(&raw)?;
        Ok(file.conflicts)
    }

    fn save(&self, conflicts: &[SyncConflict]) -> Result<(), SyncError> {
        let file = ConflictFile { conflicts: conflicts.to_vec() };
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&file)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn clear_resolved(&self, issue_id: &str) -> Result<(), SyncError> {
        let mut conflicts = self.load()?;
        conflicts.retain(|c| c.issue_id != issue_id);
        self.save(&conflicts)
    }

    pub fn clear_all(&self) -> Result<(), SyncError> {
        self.save(&[])
    }
}

fn render(issue: &Issue) -> String {
    serde_json::to_string(issue).unwrap_or_default()
}

/// Resolves one conflicted issue per `strategy`, picking the local,
/// remote, or already-merged field value. `manual` is handled by the
/// caller's interactive loop and never reaches this function.
pub fn resolve_non_interactive(
    strategy: ConflictResolution,
    local: &Issue,
    remote: &Issue,
    merged: &Issue,
) -> Result<Issue, SyncError> {
    Ok(match strategy {
        ConflictResolution::Newest => {
            if remote.updated_at >= local.updated_at { remote.clone() } else { local.clone() }
        }
        ConflictResolution::Ours => local.clone(),
        ConflictResolution::Theirs => remote.clone(),
        ConflictResolution::Manual => merged.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn issue(id: &str, updated: chrono::DateTime<Utc>) -> Issue {
        Issue::new(id, "t", updated)
    }

    #[test]
    fn record_and_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = ConflictStore::new(dir.path().join("sync_conflicts.json"));
        let now = Utc::now();
        let local = vec![issue("bd-1", now)];
        let remote = vec![issue("bd-1", now)];
        let merged = vec![MergedIssue { issue: issue("bd-1", now), strategy: MergeStrategy::Merged }];

        store.record(&local, &remote, &merged).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].issue_id, "bd-1");
    }

    #[test]
    fn resolve_newest_picks_the_later_updated_at() {
        let now = Utc::now();
        let local = issue("bd-1", now);
        let remote = issue("bd-1", now + chrono::Duration::seconds(5));
        let merged = issue("bd-1", now);
        let resolved = resolve_non_interactive(ConflictResolution::Newest, &local, &remote, &merged).unwrap();
        assert_eq!(resolved.updated_at, remote.updated_at);
    }

    #[test]
    fn clear_resolved_removes_only_the_named_issue() {
        let dir = tempdir().unwrap();
        let store = ConflictStore::new(dir.path().join("sync_conflicts.json"));
        let now = Utc::now();
        let merged = vec![
            MergedIssue { issue: issue("bd-1", now), strategy: MergeStrategy::Merged },
            MergedIssue { issue: issue("bd-2", now), strategy: MergeStrategy::Merged },
        ];
        store.record(&[issue("bd-1", now), issue("bd-2", now)], &[issue("bd-1", now), issue("bd-2", now)], &merged).unwrap();
        store.clear_resolved("bd-1").unwrap();
        let remaining = store.load().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].issue_id, "bd-2");
    }
}
