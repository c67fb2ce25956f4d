// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue -- the central domain entity (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dependency::Dependency;
use crate::enums::{IssueType, Status};

fn is_empty_set(s: &BTreeSet<String>) -> bool {
    s.is_empty()
}

/// Priority 0 (P0, most urgent) is meaningful and must never be skipped.
fn never_skip(_p: &i32) -> bool {
    false
}

/// A trackable unit of work, durable across rigs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,

    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub design: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub acceptance_criteria: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "Status::is_default")]
    pub status: Status,
    #[serde(default, skip_serializing_if = "never_skip")]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "IssueType::is_default")]
    pub issue_type: IssueType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "is_empty_set")]
    pub labels: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defer_until: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_tombstone: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_override: Option<String>,

    /// Populated only when the issue is loaded together with its edges
    /// (storage façade joins); absent in the bare-row representation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl Issue {
    /// A freshly-created issue with `created_at == updated_at == now`,
    /// satisfying invariant 2 (`UpdatedAt >= CreatedAt`) trivially.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            design: String::new(),
            acceptance_criteria: String::new(),
            notes: String::new(),
            status: Status::default(),
            priority: 2,
            issue_type: IssueType::default(),
            assignee: None,
            actor: None,
            owner: None,
            labels: BTreeSet::new(),
            external_ref: None,
            parent_id: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
            due_at: None,
            defer_until: None,
            is_tombstone: false,
            source_repo: None,
            source_formula: None,
            source_location: None,
            prefix_override: None,
            dependencies: Vec::new(),
        }
    }

    /// Invariant 2: `ClosedAt` is set iff `Status == closed`.
    pub fn closed_at_consistent(&self) -> bool {
        matches!(self.status, Status::Closed) == self.closed_at.is_some()
    }

    /// Invariant 1's ID shape: `<prefix>-<suffix>` where suffix is
    /// `[A-Za-z0-9._-]+`.
    pub fn id_matches_prefix(&self, prefix: &str) -> bool {
        let Some(rest) = self.id.strip_prefix(prefix) else { return false };
        let Some(suffix) = rest.strip_prefix('-') else { return false };
        !suffix.is_empty()
            && suffix.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }

    /// Tombstone is sticky (invariant 4): once set, `tombstone()` is the
    /// only legal way to flip it, `resurrect()` the only way back.
    pub fn tombstone(&mut self, at: DateTime<Utc>) {
        self.is_tombstone = true;
        self.updated_at = at;
    }

    pub fn resurrect(&mut self, at: DateTime<Utc>) {
        self.is_tombstone = false;
        self.updated_at = at;
    }

    pub fn overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.due_at, Some(due) if due < now && !matches!(self.status, Status::Closed))
    }

    pub fn deferred(&self, now: DateTime<Utc>) -> bool {
        matches!(self.defer_until, Some(until) if until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn new_issue_satisfies_timestamp_invariant() {
        let issue = Issue::new("bd-1", "title", now());
        assert_eq!(issue.created_at, issue.updated_at);
        assert!(issue.closed_at_consistent());
    }

    #[test]
    fn id_prefix_validation() {
        let issue = Issue::new("bd-abc123", "t", now());
        assert!(issue.id_matches_prefix("bd"));
        assert!(!issue.id_matches_prefix("xy"));

        let bad = Issue::new("bd-", "t", now());
        assert!(!bad.id_matches_prefix("bd"));
    }

    #[test]
    fn tombstone_is_sticky_until_explicit_resurrect() {
        let mut issue = Issue::new("bd-1", "t", now());
        issue.tombstone(now());
        assert!(issue.is_tombstone);
        issue.resurrect(now());
        assert!(!issue.is_tombstone);
    }

    #[test]
    fn overdue_and_deferred() {
        let mut issue = Issue::new("bd-1", "t", now());
        issue.due_at = Some(now() - chrono::Duration::days(1));
        assert!(issue.overdue(now()));
        issue.status = Status::Closed;
        assert!(!issue.overdue(now()));

        let mut deferred = Issue::new("bd-2", "t", now());
        deferred.defer_until = Some(now() + chrono::Duration::days(1));
        assert!(deferred.deferred(now()));
    }

    #[test]
    fn json_round_trip_skips_empty_fields() {
        let issue = Issue::new("bd-1", "t", now());
        let json = serde_json::to_string(&issue).unwrap();
        assert!(!json.contains("\"description\""));
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "bd-1");
    }
}
