// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency edges (spec.md §4.1 `AddDependency`/`RemoveDependency`,
//! invariant 3: the graph is simple).

use beads_core::{CoreError, Dependency, DependencyType};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::StorageError;
use crate::sqlite::store::{now_rfc3339, parse_rfc3339, TxCtx};

impl<'a> TxCtx<'a> {
    pub fn add_dependency(&self, dep: Dependency) -> Result<(), StorageError> {
        if !self.issue_exists(&dep.from_id)? {
            return Err(CoreError::IssueNotFound(dep.from_id.clone()).into());
        }
        if !self.issue_exists(&dep.to_id)? {
            return Err(CoreError::IssueNotFound(dep.to_id.clone()).into());
        }

        let existing = self.dependencies_for(&dep.from_id)?;
        if beads_core::dependency::has_duplicate(&existing, &dep) {
            return Err(CoreError::DuplicateDependency {
                from: dep.from_id.clone(),
                to: dep.to_id.clone(),
                dep_type: dep.dep_type.as_str().to_string(),
            }
            .into());
        }

        self.conn
            .execute(
                "INSERT INTO dependencies (from_id, to_id, dep_type, created_at, created_by, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    dep.from_id,
                    dep.to_id,
                    dep.dep_type.as_str(),
                    now_rfc3339(dep.created_at),
                    dep.created_by,
                    dep.metadata,
                ],
            )
            .map_err(|e| StorageError::sql("add_dependency", e))?;
        self.mark_dirty(&dep.from_id, dep.created_at)?;
        Ok(())
    }

    /// Inserts a dependency row as-is, skipping the existence/duplicate
    /// checks `add_dependency` does. Used by `replace_issue` to reconcile
    /// the dependency table against an already-reconciled `Issue.dependencies`
    /// (a three-way merge result), mirroring `add_label_row` for labels.
    pub(crate) fn add_dependency_row(&self, dep: &Dependency) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO dependencies (from_id, to_id, dep_type, created_at, created_by, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    dep.from_id,
                    dep.to_id,
                    dep.dep_type.as_str(),
                    now_rfc3339(dep.created_at),
                    dep.created_by,
                    dep.metadata,
                ],
            )
            .map_err(|e| StorageError::sql("add_dependency", e))?;
        Ok(())
    }

    pub fn remove_dependency(&self, from_id: &str, to_id: &str, dep_type: &DependencyType, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.conn
            .execute(
                "DELETE FROM dependencies WHERE from_id = ?1 AND to_id = ?2 AND dep_type = ?3",
                params![from_id, to_id, dep_type.as_str()],
            )
            .map_err(|e| StorageError::sql("remove_dependency", e))?;
        self.mark_dirty(from_id, now)?;
        Ok(())
    }

    pub fn dependencies_for(&self, issue_id: &str) -> Result<Vec<Dependency>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT from_id, to_id, dep_type, created_at, created_by, metadata FROM dependencies WHERE from_id = ?1")
            .map_err(|e| StorageError::sql("dependencies_for", e))?;
        let rows = stmt
            .query_map(params![issue_id], |row| {
                Ok(Dependency {
                    from_id: row.get(0)?,
                    to_id: row.get(1)?,
                    dep_type: DependencyType::from(row.get::<_, String>(2)?),
                    created_at: row.get::<_, String>(3)?.parse().unwrap_or_default(),
                    created_by: row.get(4)?,
                    metadata: row.get(5)?,
                })
            })
            .map_err(|e| StorageError::sql("dependencies_for", e))?;

        let mut deps = Vec::new();
        for row in rows {
            let mut dep = row.map_err(|e| StorageError::sql("dependencies_for", e))?;
            dep.created_at = parse_rfc3339(&now_rfc3339(dep.created_at)).unwrap_or(dep.created_at);
            deps.push(dep);
        }
        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::Store;
    use beads_core::Issue;

    fn dep(from: &str, to: &str) -> Dependency {
        Dependency {
            from_id: from.into(),
            to_id: to.into(),
            dep_type: DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: None,
            metadata: None,
        }
    }

    #[test]
    fn rejects_duplicate_edge_of_same_type() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "a", Utc::now()), "u", "bd")).unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-2", "b", Utc::now()), "u", "bd")).unwrap();

        store.run_in_transaction(|tx| tx.add_dependency(dep("bd-1", "bd-2"))).unwrap();
        let err = store.run_in_transaction(|tx| tx.add_dependency(dep("bd-1", "bd-2")));
        assert!(err.is_err());
    }

    #[test]
    fn allows_different_edge_types_between_same_pair() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-1", "a", Utc::now()), "u", "bd")).unwrap();
        store.run_in_transaction(|tx| tx.create_issue(Issue::new("bd-2", "b", Utc::now()), "u", "bd")).unwrap();

        store.run_in_transaction(|tx| tx.add_dependency(dep("bd-1", "bd-2"))).unwrap();
        let mut other = dep("bd-1", "bd-2");
        other.dep_type = DependencyType::Related;
        store.run_in_transaction(|tx| tx.add_dependency(other)).unwrap();

        let deps = store.read(|tx| tx.dependencies_for("bd-1")).unwrap();
        assert_eq!(deps.len(), 2);
    }
}
