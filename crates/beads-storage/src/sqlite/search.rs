// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SearchIssues` (spec.md §4.1): a single filter object combining
//! status/priority range/assignee/labels/type/text/date-range/overdue/
//! deferred/tombstone predicates, all ANDed together.

use std::collections::BTreeSet;

use beads_core::{IssueType, Status};
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;

use crate::error::StorageError;
use crate::sqlite::issues::row_to_issue;
use crate::sqlite::store::{now_rfc3339, TxCtx};
use beads_core::Issue;

#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub status: Option<Status>,
    pub priority_min: Option<i32>,
    pub priority_max: Option<i32>,
    pub assignee: Option<String>,
    pub unassigned: bool,
    pub labels: BTreeSet<String>,
    pub issue_type: Option<IssueType>,
    pub text: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub overdue: bool,
    pub deferred: bool,
    pub include_tombstones: bool,
}

impl<'a> TxCtx<'a> {
    pub fn search_issues(&self, filter: &Filter, now: DateTime<Utc>) -> Result<Vec<Issue>, StorageError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if !filter.include_tombstones {
            clauses.push("is_tombstone = 0".to_string());
        }
        if let Some(status) = &filter.status {
            clauses.push("status = ?".to_string());
            params.push(SqlValue::Text(status.as_str().to_string()));
        }
        if let Some(min) = filter.priority_min {
            clauses.push("priority >= ?".to_string());
            params.push(SqlValue::Integer(min as i64));
        }
        if let Some(max) = filter.priority_max {
            clauses.push("priority <= ?".to_string());
            params.push(SqlValue::Integer(max as i64));
        }
        if filter.unassigned {
            clauses.push("assignee IS NULL".to_string());
        } else if let Some(assignee) = &filter.assignee {
            clauses.push("assignee = ?".to_string());
            params.push(SqlValue::Text(assignee.clone()));
        }
        if let Some(issue_type) = &filter.issue_type {
            clauses.push("issue_type = ?".to_string());
            params.push(SqlValue::Text(issue_type.as_str().to_string()));
        }
        if let Some(text) = &filter.text {
            clauses.push("(title LIKE ? OR description LIKE ?)".to_string());
            let pattern = format!("%{}%", text.replace('%', "\\%").replace('_', "\\_"));
            params.push(SqlValue::Text(pattern.clone()));
            params.push(SqlValue::Text(pattern));
        }
        if let Some(after) = filter.created_after {
            clauses.push("created_at >= ?".to_string());
            params.push(SqlValue::Text(now_rfc3339(after)));
        }
        if let Some(before) = filter.created_before {
            clauses.push("created_at <= ?".to_string());
            params.push(SqlValue::Text(now_rfc3339(before)));
        }
        if filter.overdue {
            clauses.push("due_at IS NOT NULL AND due_at < ? AND status != 'closed'".to_string());
            params.push(SqlValue::Text(now_rfc3339(now)));
        }
        if filter.deferred {
            clauses.push("defer_until IS NOT NULL AND defer_until > ?".to_string());
            params.push(SqlValue::Text(now_rfc3339(now)));
        }
        for label in &filter.labels {
            clauses.push("id IN (SELECT issue_id FROM labels WHERE label = ?)".to_string());
            params.push(SqlValue::Text(label.clone()));
        }

        let where_clause = if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
        let sql = format!("SELECT * FROM issues {where_clause} ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql).map_err(|e| StorageError::sql("search_issues", e))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_issue)
            .map_err(|e| StorageError::sql("search_issues", e))?;

        let mut issues = Vec::new();
        for row in rows {
            let mut issue = row.map_err(|e| StorageError::sql("search_issues", e))??;
            issue.labels = self.labels_for(&issue.id)?;
            issue.dependencies = self.dependencies_for(&issue.id)?;
            issues.push(issue);
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::Store;
    use chrono::Duration;

    fn seed(store: &Store) {
        store
            .run_in_transaction(|tx| {
                let mut a = Issue::new("bd-1", "fix the parser", Utc::now());
                a.status = Status::Open;
                a.priority = 1;
                a.assignee = Some("alice".into());
                tx.create_issue(a, "u", "bd")
            })
            .unwrap();
        store
            .run_in_transaction(|tx| {
                let mut b = Issue::new("bd-2", "write docs", Utc::now());
                b.status = Status::Closed;
                b.priority = 3;
                tx.create_issue(b, "u", "bd")
            })
            .unwrap();
    }

    #[test]
    fn filters_by_status() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        let filter = Filter { status: Some(Status::Open), ..Default::default() };
        let results = store.read(|tx| tx.search_issues(&filter, Utc::now())).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-1");
    }

    #[test]
    fn filters_by_text_substring() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        let filter = Filter { text: Some("docs".into()), ..Default::default() };
        let results = store.read(|tx| tx.search_issues(&filter, Utc::now())).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-2");
    }

    #[test]
    fn excludes_tombstones_by_default() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        store.run_in_transaction(|tx| tx.delete_issue("bd-1", "u", Utc::now()).map(|_| ())).unwrap();
        let results = store.read(|tx| tx.search_issues(&Filter::default(), Utc::now())).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-2");

        let with_tombstones = Filter { include_tombstones: true, ..Default::default() };
        let results = store.read(|tx| tx.search_issues(&with_tombstones, Utc::now())).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn overdue_excludes_closed_issues() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        store
            .run_in_transaction(|tx| {
                let mut issue = Issue::new("bd-1", "late", now);
                issue.due_at = Some(now - Duration::days(1));
                tx.create_issue(issue, "u", "bd")
            })
            .unwrap();
        let filter = Filter { overdue: true, ..Default::default() };
        let results = store.read(|tx| tx.search_issues(&filter, now)).unwrap();
        assert_eq!(results.len(), 1);

        store
            .run_in_transaction(|tx| {
                tx.update_issue("bd-1", crate::sqlite::issues::IssueUpdate { status: Some(Status::Closed), ..Default::default() }, "u", now)
            })
            .unwrap();
        let results = store.read(|tx| tx.search_issues(&filter, now)).unwrap();
        assert!(results.is_empty());
    }
}
