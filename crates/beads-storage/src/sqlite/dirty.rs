// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dirty-issue tracking (spec.md §4.1: "any mutation marks its issue
//! dirty until a successful export clears it").

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::StorageError;
use crate::sqlite::store::{now_rfc3339, TxCtx};

impl<'a> TxCtx<'a> {
    pub fn mark_dirty(&self, issue_id: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO dirty_issues (issue_id, marked_at) VALUES (?1, ?2)
                 ON CONFLICT(issue_id) DO UPDATE SET marked_at = excluded.marked_at",
                params![issue_id, now_rfc3339(now)],
            )
            .map_err(|e| StorageError::sql("mark_dirty", e))?;
        Ok(())
    }

    pub fn get_dirty_issues(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT issue_id FROM dirty_issues ORDER BY marked_at ASC")
            .map_err(|e| StorageError::sql("get_dirty_issues", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StorageError::sql("get_dirty_issues", e))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| StorageError::sql("get_dirty_issues", e))
    }

    /// Clears dirty markers for exactly the issues that were included in
    /// a successful export (spec.md §4.1). A mutation that lands after
    /// the export snapshot was taken but before this call re-marks the
    /// issue dirty, so it is intentionally not swept up here.
    pub fn clear_dirty(&self, issue_ids: &[String]) -> Result<(), StorageError> {
        for id in issue_ids {
            self.conn
                .execute("DELETE FROM dirty_issues WHERE issue_id = ?1", params![id])
                .map_err(|e| StorageError::sql("clear_dirty", e))?;
        }
        Ok(())
    }

    pub fn clear_all_dirty(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch("DELETE FROM dirty_issues")
            .map_err(|e| StorageError::sql("clear_all_dirty", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::Store;
    use beads_core::Issue;

    #[test]
    fn create_and_update_mark_dirty_once_each() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "t", Utc::now()), "a", "bd")).unwrap();
        let dirty = store.read(|tx| tx.get_dirty_issues()).unwrap();
        assert_eq!(dirty, vec!["bd-1".to_string()]);
    }

    #[test]
    fn clear_dirty_removes_only_named_issues() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "a", Utc::now()), "u", "bd")).unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-2", "b", Utc::now()), "u", "bd")).unwrap();

        store.run_in_transaction(|tx| tx.clear_dirty(&["bd-1".to_string()])).unwrap();
        let dirty = store.read(|tx| tx.get_dirty_issues()).unwrap();
        assert_eq!(dirty, vec!["bd-2".to_string()]);
    }

    #[test]
    fn remark_after_clear_keeps_issue_dirty() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "a", Utc::now()), "u", "bd")).unwrap();
        store.run_in_transaction(|tx| tx.clear_dirty(&["bd-1".to_string()])).unwrap();
        store.run_in_transaction(|tx| tx.add_label("bd-1", "x", "u", Utc::now())).unwrap();
        let dirty = store.read(|tx| tx.get_dirty_issues()).unwrap();
        assert_eq!(dirty, vec!["bd-1".to_string()]);
    }
}
