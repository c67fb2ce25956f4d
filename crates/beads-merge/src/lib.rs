// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! beads-merge: the three-way merge engine (spec.md §4.4). Reconciles
//! `base` (last successful sync snapshot, possibly absent), `local`
//! (current database), and `remote` (post-pull JSONL) issue sets into one
//! merged set with a per-issue strategy label and a conflict count.
//!
//! Grounded on the teacher's `runbook::import::merge` entity-map merge
//! (build maps keyed by identity, walk the union, resolve per key) --
//! generalized here from "local always wins" to full three-way
//! reconciliation since issues, unlike runbook entities, are edited
//! independently on both sides between syncs.

use std::collections::{BTreeMap, BTreeSet};

use beads_core::Issue;
use serde::{Deserialize, Serialize};

/// How a single issue's merged value was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Present only locally, or local and remote already agreed.
    Local,
    /// Present only remotely, or only remote changed since base.
    Remote,
    /// Local and remote are field-equivalent.
    Same,
    /// Both sides changed since base (or base is unknown): field-by-field
    /// reconciliation ran.
    Merged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedIssue {
    pub issue: Issue,
    pub strategy: MergeStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub issues: Vec<MergedIssue>,
    pub conflict_count: usize,
}

fn by_id(issues: &[Issue]) -> BTreeMap<&str, &Issue> {
    issues.iter().map(|i| (i.id.as_str(), i)).collect()
}

/// Runs the three-way merge (spec.md §4.4 algorithm). `base` is `None`
/// on a workspace's first sync, before any `sync_base.jsonl` exists.
pub fn merge(base: Option<&[Issue]>, local: &[Issue], remote: &[Issue]) -> MergeResult {
    let base_map = base.map(by_id).unwrap_or_default();
    let local_map = by_id(local);
    let remote_map = by_id(remote);

    let all_ids: BTreeSet<&str> = local_map.keys().chain(remote_map.keys()).copied().collect();

    let mut issues = Vec::with_capacity(all_ids.len());
    let mut conflict_count = 0;

    for id in all_ids {
        let local_issue = local_map.get(id).copied();
        let remote_issue = remote_map.get(id).copied();
        let base_issue = base_map.get(id).copied();

        let resolved = match (local_issue, remote_issue) {
            (Some(l), None) => MergedIssue { issue: l.clone(), strategy: MergeStrategy::Local },
            (None, Some(r)) => MergedIssue { issue: r.clone(), strategy: MergeStrategy::Remote },
            (Some(l), Some(r)) => {
                if l == r {
                    MergedIssue { issue: l.clone(), strategy: MergeStrategy::Same }
                } else if base_issue.is_some_and(|b| l == b) {
                    MergedIssue { issue: r.clone(), strategy: MergeStrategy::Remote }
                } else if base_issue.is_some_and(|b| r == b) {
                    MergedIssue { issue: l.clone(), strategy: MergeStrategy::Local }
                } else {
                    conflict_count += 1;
                    MergedIssue { issue: reconcile_fields(l, r), strategy: MergeStrategy::Merged }
                }
            }
            (None, None) => unreachable!("id came from the union of local and remote keys"),
        };

        issues.push(resolved);
    }

    MergeResult { issues, conflict_count }
}

/// Field-by-field reconciliation for a true conflict (spec.md §4.4):
/// scalars are last-writer-wins by `updated_at` (remote wins ties),
/// labels union, tombstone sticky, merged `updated_at` is the max of the
/// two sides.
fn reconcile_fields(local: &Issue, remote: &Issue) -> Issue {
    let remote_is_newer = remote.updated_at >= local.updated_at;
    let (winner, loser) = if remote_is_newer { (remote, local) } else { (local, remote) };

    let mut merged = winner.clone();
    merged.labels = local.labels.union(&remote.labels).cloned().collect();
    merged.is_tombstone = local.is_tombstone || remote.is_tombstone;
    merged.updated_at = local.updated_at.max(remote.updated_at);
    merged.dependencies = winner.dependencies.clone();
    let _ = loser;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn issue(id: &str, title: &str, updated_at: DateTime<Utc>) -> Issue {
        let mut i = Issue::new(id, title, updated_at);
        i.updated_at = updated_at;
        i
    }

    #[test]
    fn local_only_keeps_local() {
        let local = vec![issue("bd-1", "a", at("2026-01-01T00:00:00Z"))];
        let result = merge(None, &local, &[]);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].strategy, MergeStrategy::Local);
        assert_eq!(result.conflict_count, 0);
    }

    #[test]
    fn remote_only_keeps_remote() {
        let remote = vec![issue("bd-1", "a", at("2026-01-01T00:00:00Z"))];
        let result = merge(None, &[], &remote);
        assert_eq!(result.issues[0].strategy, MergeStrategy::Remote);
    }

    #[test]
    fn identical_sides_are_same_with_no_conflict() {
        let a = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        let result = merge(None, &[a.clone()], &[a]);
        assert_eq!(result.issues[0].strategy, MergeStrategy::Same);
        assert_eq!(result.conflict_count, 0);
    }

    #[test]
    fn only_remote_changed_since_base_takes_remote_without_conflict() {
        let base = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        let local = base.clone();
        let mut remote = base.clone();
        remote.title = "b".into();
        remote.updated_at = at("2026-01-02T00:00:00Z");

        let result = merge(Some(&[base]), &[local], &[remote]);
        assert_eq!(result.issues[0].strategy, MergeStrategy::Remote);
        assert_eq!(result.conflict_count, 0);
    }

    #[test]
    fn both_sides_changed_is_a_true_conflict_with_label_union() {
        let base = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        let mut local = base.clone();
        local.title = "local title".into();
        local.updated_at = at("2026-01-02T00:00:00Z");
        local.labels.insert("from-local".into());

        let mut remote = base.clone();
        remote.title = "remote title".into();
        remote.updated_at = at("2026-01-03T00:00:00Z");
        remote.labels.insert("from-remote".into());

        let result = merge(Some(&[base]), &[local], &[remote]);
        assert_eq!(result.conflict_count, 1);
        let merged = &result.issues[0];
        assert_eq!(merged.strategy, MergeStrategy::Merged);
        assert_eq!(merged.issue.title, "remote title");
        assert!(merged.issue.labels.contains("from-local"));
        assert!(merged.issue.labels.contains("from-remote"));
    }

    #[test]
    fn tombstone_set_on_either_side_stays_set() {
        let base = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        let mut local = base.clone();
        local.title = "changed".into();
        local.updated_at = at("2026-01-02T00:00:00Z");

        let mut remote = base.clone();
        remote.is_tombstone = true;
        remote.updated_at = at("2026-01-02T00:00:00Z");

        let result = merge(Some(&[base]), &[local], &[remote]);
        assert!(result.issues[0].issue.is_tombstone);
    }

    #[test]
    fn tie_updated_at_breaks_toward_remote() {
        let base = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        let mut local = base.clone();
        local.title = "local".into();
        local.updated_at = at("2026-01-02T00:00:00Z");

        let mut remote = base.clone();
        remote.title = "remote".into();
        remote.updated_at = at("2026-01-02T00:00:00Z");

        let result = merge(Some(&[base]), &[local], &[remote]);
        assert_eq!(result.issues[0].issue.title, "remote");
    }

    #[test]
    fn missing_base_always_falls_through_to_merged_when_sides_differ() {
        let mut local = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        local.labels.insert("x".into());
        let mut remote = issue("bd-1", "b", at("2026-01-02T00:00:00Z"));
        remote.labels.insert("y".into());

        let result = merge(None, &[local], &[remote]);
        assert_eq!(result.issues[0].strategy, MergeStrategy::Merged);
        assert_eq!(result.conflict_count, 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let base = issue("bd-1", "a", at("2026-01-01T00:00:00Z"));
        let mut local = base.clone();
        local.title = "local".into();
        local.updated_at = at("2026-01-02T00:00:00Z");
        let mut remote = base.clone();
        remote.title = "remote".into();
        remote.updated_at = at("2026-01-03T00:00:00Z");

        let first = merge(Some(&[base.clone()]), &[local.clone()], &[remote.clone()]);
        let merged_issues: Vec<Issue> = first.issues.iter().map(|m| m.issue.clone()).collect();
        let second = merge(Some(&[base]), &merged_issues, &merged_issues);
        assert_eq!(second.issues[0].issue, merged_issues[0]);
        assert_eq!(second.conflict_count, 0);
    }
}
