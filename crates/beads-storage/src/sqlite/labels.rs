// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Labels: a per-issue set of strings (spec.md §3). Union semantics for
//! label conflicts during merge live in `beads-merge`; this module only
//! owns the per-issue set storage.

use beads_core::{CoreError, MutationEvent};
use chrono::{DateTime, Utc};
use rusqlite::params;
use std::collections::BTreeSet;

use crate::error::StorageError;
use crate::sqlite::store::{now_rfc3339, TxCtx};

impl<'a> TxCtx<'a> {
    pub(crate) fn add_label_row(&self, issue_id: &str, label: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO labels (issue_id, label) VALUES (?1, ?2)",
                params![issue_id, label],
            )
            .map_err(|e| StorageError::sql("add_label", e))?;
        Ok(())
    }

    pub fn labels_for(&self, issue_id: &str) -> Result<BTreeSet<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT label FROM labels WHERE issue_id = ?1")
            .map_err(|e| StorageError::sql("labels_for", e))?;
        let rows = stmt
            .query_map(params![issue_id], |r| r.get::<_, String>(0))
            .map_err(|e| StorageError::sql("labels_for", e))?;
        rows.collect::<Result<BTreeSet<_>, _>>().map_err(|e| StorageError::sql("labels_for", e))
    }

    /// Adds `label` to `issue_id`'s label set, emitting an `update`
    /// event (spec.md §4.1: `AddLabel(id, label, actor)` / "labels are
    /// a set").
    pub fn add_label(&self, issue_id: &str, label: &str, actor: &str, now: DateTime<Utc>) -> Result<MutationEvent, StorageError> {
        if !self.issue_exists(issue_id)? {
            return Err(CoreError::IssueNotFound(issue_id.to_string()).into());
        }
        self.add_label_row(issue_id, label)?;
        self.conn
            .execute("UPDATE issues SET updated_at = ?2 WHERE id = ?1", params![issue_id, now_rfc3339(now)])
            .map_err(|e| StorageError::sql("touch_issue", e))?;
        self.mark_dirty(issue_id, now)?;

        Ok(MutationEvent {
            timestamp: now,
            event_type: beads_core::MutationType::Update,
            issue_id: issue_id.to_string(),
            title: None,
            actor: Some(actor.to_string()),
            assignee: None,
            old_status: None,
            new_status: None,
            parent_id: None,
            step_count: None,
        })
    }

    pub fn remove_label(&self, issue_id: &str, label: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM labels WHERE issue_id = ?1 AND label = ?2", params![issue_id, label])
            .map_err(|e| StorageError::sql("remove_label", e))?;
        self.mark_dirty(issue_id, now)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::Store;
    use beads_core::Issue;

    #[test]
    fn labels_are_a_deduplicated_set() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "t", Utc::now()), "a", "bd")).unwrap();
        store.run_in_transaction(|tx| tx.add_label("bd-1", "urgent", "a", Utc::now())).unwrap();
        store.run_in_transaction(|tx| tx.add_label("bd-1", "urgent", "a", Utc::now())).unwrap();
        let labels = store.read(|tx| tx.labels_for("bd-1")).unwrap();
        assert_eq!(labels.len(), 1);
    }
}
