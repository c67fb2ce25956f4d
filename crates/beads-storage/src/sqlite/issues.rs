// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue CRUD (spec.md §4.1: `CreateIssue`, `UpdateIssue`, `DeleteIssue`,
//! `GetIssue`). Every mutation here runs inside a [`TxCtx`] so the row
//! change and the dirty-set update share one transaction.

use beads_core::id::{generate_suffix, IdStrategy};
use beads_core::{CoreError, Issue, IssueType, MutationEvent, Status};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::error::StorageError;
use crate::sqlite::store::{now_rfc3339, parse_rfc3339, TxCtx};

/// Field-level patch for [`TxCtx::update_issue`]. `None` means "leave
/// unchanged"; this is the "whole-field replacement" semantics of
/// spec.md §4.1 -- a present field overwrites, it never merges.
#[derive(Debug, Default, Clone)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub design: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub notes: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<i32>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<Option<String>>,
    pub actor_field: Option<Option<String>>,
    pub owner: Option<Option<String>>,
    pub external_ref: Option<Option<String>>,
    pub parent_id: Option<Option<String>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub defer_until: Option<Option<DateTime<Utc>>>,
}

impl<'a> TxCtx<'a> {
    pub fn issue_exists(&self, id: &str) -> Result<bool, StorageError> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM issues WHERE id = ?1", params![id], |r| r.get(0))
            .optional()
            .map_err(|e| StorageError::sql("issue_exists", e))?;
        Ok(found.is_some())
    }

    fn next_child_index(&self, parent_suffix: &str) -> Result<u32, StorageError> {
        let prefix = format!("{parent_suffix}.%");
        let max: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM issues WHERE id LIKE ?1 ORDER BY LENGTH(id) DESC, id DESC LIMIT 1",
                params![prefix],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| StorageError::sql("next_child_index", e))?;
        let next = max
            .and_then(|id| id.rsplit('.').next().and_then(|n| n.parse::<u32>().ok()))
            .map(|n| n + 1)
            .unwrap_or(1);
        Ok(next)
    }

    /// Assigns a fresh, collision-free id for `issue` under `prefix`,
    /// preferring a child-of-parent suffix when `parent_id` is present
    /// and otherwise falling back to a short content hash (spec.md
    /// §4.1's three id strategies, minus the explicit-id path which the
    /// caller handles by simply setting `issue.id` before calling
    /// [`TxCtx::create_issue`]).
    pub fn assign_issue_id(&self, prefix: &str, title: &str, parent_id: Option<&str>, now: DateTime<Utc>) -> Result<String, StorageError> {
        if let Some(parent) = parent_id {
            let parent_suffix = parent.strip_prefix(prefix).and_then(|s| s.strip_prefix('-')).unwrap_or(parent);
            let index = self.next_child_index(parent_suffix)?;
            let suffix = generate_suffix(&IdStrategy::ChildOfParent { parent_suffix: parent_suffix.to_string(), index });
            return Ok(beads_core::id::full_id(prefix, &suffix));
        }

        let seed = format!("{title}:{}", now.timestamp_nanos_opt().unwrap_or_default());
        for salt in 0..1000u32 {
            let suffix = generate_suffix(&IdStrategy::ShortHash { seed: seed.clone(), salt });
            let candidate = beads_core::id::full_id(prefix, &suffix);
            if !self.issue_exists(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(StorageError::Corrupt("exhausted id salt space".into()))
    }

    /// Inserts `issue`, assigning an id first if `issue.id` is empty.
    /// Returns the final id and the `create` mutation event for the
    /// caller to publish once the enclosing transaction commits.
    pub fn create_issue(&self, mut issue: Issue, actor: &str, prefix: &str) -> Result<(String, MutationEvent), StorageError> {
        if issue.id.is_empty() {
            issue.id = self.assign_issue_id(prefix, &issue.title, issue.parent_id.as_deref(), issue.created_at)?;
        } else if self.issue_exists(&issue.id)? {
            return Err(CoreError::IssueExists(issue.id.clone()).into());
        }

        self.conn
            .execute(
                "INSERT INTO issues (
                    id, title, description, design, acceptance_criteria, notes,
                    status, priority, issue_type, assignee, actor, owner,
                    external_ref, parent_id, created_at, updated_at, closed_at,
                    due_at, defer_until, is_tombstone, source_repo, source_formula,
                    source_location, prefix_override
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24)",
                params![
                    issue.id,
                    issue.title,
                    issue.description,
                    issue.design,
                    issue.acceptance_criteria,
                    issue.notes,
                    issue.status.as_str(),
                    issue.priority,
                    issue.issue_type.as_str(),
                    issue.assignee,
                    issue.actor,
                    issue.owner,
                    issue.external_ref,
                    issue.parent_id,
                    now_rfc3339(issue.created_at),
                    now_rfc3339(issue.updated_at),
                    issue.closed_at.map(now_rfc3339),
                    issue.due_at.map(now_rfc3339),
                    issue.defer_until.map(now_rfc3339),
                    issue.is_tombstone as i64,
                    issue.source_repo,
                    issue.source_formula,
                    issue.source_location,
                    issue.prefix_override,
                ],
            )
            .map_err(|e| StorageError::sql("create_issue", e))?;

        for label in &issue.labels {
            self.add_label_row(&issue.id, label)?;
        }
        self.mark_dirty(&issue.id, issue.updated_at)?;

        let event = MutationEvent::create(issue.id.clone(), issue.title.clone(), actor, issue.updated_at);
        Ok((issue.id, event))
    }

    /// Applies `update` to `id`, touching `updated_at`. Returns the
    /// `update` event (and `status` event, per spec.md §4.1, when the
    /// patch changes `status`).
    pub fn update_issue(&self, id: &str, update: IssueUpdate, actor: &str, now: DateTime<Utc>) -> Result<Vec<MutationEvent>, StorageError> {
        let before = self.get_issue(id)?.ok_or_else(|| CoreError::IssueNotFound(id.to_string()))?;

        let title = update.title.unwrap_or(before.title.clone());
        let description = update.description.unwrap_or(before.description.clone());
        let design = update.design.unwrap_or(before.design.clone());
        let acceptance_criteria = update.acceptance_criteria.unwrap_or(before.acceptance_criteria.clone());
        let notes = update.notes.unwrap_or(before.notes.clone());
        let status = update.status.clone().unwrap_or(before.status.clone());
        let priority = update.priority.unwrap_or(before.priority);
        let issue_type = update.issue_type.clone().unwrap_or(before.issue_type.clone());
        let assignee = update.assignee.unwrap_or(before.assignee.clone());
        let actor_field = update.actor_field.unwrap_or(before.actor.clone());
        let owner = update.owner.unwrap_or(before.owner.clone());
        let external_ref = update.external_ref.unwrap_or(before.external_ref.clone());
        let parent_id = update.parent_id.unwrap_or(before.parent_id.clone());
        let due_at = update.due_at.unwrap_or(before.due_at);
        let defer_until = update.defer_until.unwrap_or(before.defer_until);

        // Invariant 2: ClosedAt is set iff Status == closed.
        let closed_at = match status {
            Status::Closed => before.closed_at.or(Some(now)),
            _ => None,
        };

        self.conn
            .execute(
                "UPDATE issues SET title=?2, description=?3, design=?4, acceptance_criteria=?5,
                 notes=?6, status=?7, priority=?8, issue_type=?9, assignee=?10, actor=?11,
                 owner=?12, external_ref=?13, parent_id=?14, updated_at=?15, closed_at=?16,
                 due_at=?17, defer_until=?18
                 WHERE id=?1",
                params![
                    id,
                    title,
                    description,
                    design,
                    acceptance_criteria,
                    notes,
                    status.as_str(),
                    priority,
                    issue_type.as_str(),
                    assignee,
                    actor_field,
                    owner,
                    external_ref,
                    parent_id,
                    now_rfc3339(now),
                    closed_at.map(now_rfc3339),
                    due_at.map(now_rfc3339),
                    defer_until.map(now_rfc3339),
                ],
            )
            .map_err(|e| StorageError::sql("update_issue", e))?;

        self.mark_dirty(id, now)?;

        let mut events = vec![MutationEvent {
            timestamp: now,
            event_type: beads_core::MutationType::Update,
            issue_id: id.to_string(),
            title: Some(title),
            actor: Some(actor.to_string()),
            assignee: assignee.clone(),
            old_status: None,
            new_status: None,
            parent_id: parent_id.clone(),
            step_count: None,
        }];

        if before.status != status {
            events.push(MutationEvent::status_change(id, actor, before.status, status, now));
        }

        Ok(events)
    }

    /// Sets the tombstone flag (invariant 4: sticky until explicit
    /// resurrect). Deleting an already-tombstoned issue is a no-op that
    /// still emits a `delete` event, matching idempotent client retries.
    pub fn delete_issue(&self, id: &str, actor: &str, now: DateTime<Utc>) -> Result<MutationEvent, StorageError> {
        let before = self.get_issue(id)?.ok_or_else(|| CoreError::IssueNotFound(id.to_string()))?;
        self.conn
            .execute(
                "UPDATE issues SET is_tombstone = 1, updated_at = ?2 WHERE id = ?1",
                params![id, now_rfc3339(now)],
            )
            .map_err(|e| StorageError::sql("delete_issue", e))?;
        self.mark_dirty(id, now)?;

        Ok(MutationEvent {
            timestamp: now,
            event_type: beads_core::MutationType::Delete,
            issue_id: id.to_string(),
            title: Some(before.title),
            actor: Some(actor.to_string()),
            assignee: None,
            old_status: None,
            new_status: None,
            parent_id: None,
            step_count: None,
        })
    }

    /// Clears the tombstone flag, the only legal un-delete path
    /// (invariant 4).
    pub fn resurrect_issue(&self, id: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.conn
            .execute(
                "UPDATE issues SET is_tombstone = 0, updated_at = ?2 WHERE id = ?1",
                params![id, now_rfc3339(now)],
            )
            .map_err(|e| StorageError::sql("resurrect_issue", e))?;
        self.mark_dirty(id, now)?;
        Ok(())
    }

    /// Overwrites (or inserts) `issue` wholesale, including its labels,
    /// bypassing the per-field `update_issue` patch semantics. Used by
    /// `beads-sync` to apply a merged issue set after a three-way merge,
    /// where the merge engine -- not a single actor -- already decided
    /// the final field values.
    pub fn replace_issue(&self, issue: &Issue) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO issues (
                    id, title, description, design, acceptance_criteria, notes,
                    status, priority, issue_type, assignee, actor, owner,
                    external_ref, parent_id, created_at, updated_at, closed_at,
                    due_at, defer_until, is_tombstone, source_repo, source_formula,
                    source_location, prefix_override
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24)
                ON CONFLICT(id) DO UPDATE SET
                    title=excluded.title, description=excluded.description, design=excluded.design,
                    acceptance_criteria=excluded.acceptance_criteria, notes=excluded.notes,
                    status=excluded.status, priority=excluded.priority, issue_type=excluded.issue_type,
                    assignee=excluded.assignee, actor=excluded.actor, owner=excluded.owner,
                    external_ref=excluded.external_ref, parent_id=excluded.parent_id,
                    created_at=excluded.created_at, updated_at=excluded.updated_at, closed_at=excluded.closed_at,
                    due_at=excluded.due_at, defer_until=excluded.defer_until, is_tombstone=excluded.is_tombstone,
                    source_repo=excluded.source_repo, source_formula=excluded.source_formula,
                    source_location=excluded.source_location, prefix_override=excluded.prefix_override",
                params![
                    issue.id,
                    issue.title,
                    issue.description,
                    issue.design,
                    issue.acceptance_criteria,
                    issue.notes,
                    issue.status.as_str(),
                    issue.priority,
                    issue.issue_type.as_str(),
                    issue.assignee,
                    issue.actor,
                    issue.owner,
                    issue.external_ref,
                    issue.parent_id,
                    now_rfc3339(issue.created_at),
                    now_rfc3339(issue.updated_at),
                    issue.closed_at.map(now_rfc3339),
                    issue.due_at.map(now_rfc3339),
                    issue.defer_until.map(now_rfc3339),
                    issue.is_tombstone as i64,
                    issue.source_repo,
                    issue.source_formula,
                    issue.source_location,
                    issue.prefix_override,
                ],
            )
            .map_err(|e| StorageError::sql("replace_issue", e))?;

        self.conn
            .execute("DELETE FROM labels WHERE issue_id = ?1", params![issue.id])
            .map_err(|e| StorageError::sql("replace_issue", e))?;
        for label in &issue.labels {
            self.add_label_row(&issue.id, label)?;
        }

        self.conn
            .execute("DELETE FROM dependencies WHERE from_id = ?1", params![issue.id])
            .map_err(|e| StorageError::sql("replace_issue", e))?;
        for dep in &issue.dependencies {
            self.add_dependency_row(dep)?;
        }

        self.mark_dirty(&issue.id, issue.updated_at)?;
        Ok(())
    }

    pub fn get_issue(&self, id: &str) -> Result<Option<Issue>, StorageError> {
        let row = self
            .conn
            .query_row("SELECT * FROM issues WHERE id = ?1", params![id], row_to_issue)
            .optional()
            .map_err(|e| StorageError::sql("get_issue", e))?;
        let Some(mut issue) = row.transpose()? else { return Ok(None) };
        issue.labels = self.labels_for(id)?;
        issue.dependencies = self.dependencies_for(id)?;
        Ok(Some(issue))
    }
}

pub(crate) fn row_to_issue(row: &rusqlite::Row) -> rusqlite::Result<Result<Issue, StorageError>> {
    Ok((|| -> Result<Issue, StorageError> {
        Ok(Issue {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            design: row.get("design")?,
            acceptance_criteria: row.get("acceptance_criteria")?,
            notes: row.get("notes")?,
            status: Status::from(row.get::<_, String>("status")?),
            priority: row.get("priority")?,
            issue_type: IssueType::from(row.get::<_, String>("issue_type")?),
            assignee: row.get("assignee")?,
            actor: row.get("actor")?,
            owner: row.get("owner")?,
            labels: Default::default(),
            external_ref: row.get("external_ref")?,
            parent_id: row.get("parent_id")?,
            created_at: parse_rfc3339(&row.get::<_, String>("created_at")?)?,
            updated_at: parse_rfc3339(&row.get::<_, String>("updated_at")?)?,
            closed_at: opt_ts(row, "closed_at")?,
            due_at: opt_ts(row, "due_at")?,
            defer_until: opt_ts(row, "defer_until")?,
            is_tombstone: row.get::<_, i64>("is_tombstone")? != 0,
            source_repo: row.get("source_repo")?,
            source_formula: row.get("source_formula")?,
            source_location: row.get("source_location")?,
            prefix_override: row.get("prefix_override")?,
            dependencies: Vec::new(),
        })
    })())
}

fn opt_ts(row: &rusqlite::Row, col: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| parse_rfc3339(&s)).transpose()
}
