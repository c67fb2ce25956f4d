// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table layout for `beads.db`. Columns map 1:1 onto [`beads_core::Issue`]
//! and [`beads_core::Dependency`] fields; the row store is never queried
//! with bespoke SQL from outside this crate (spec.md §1 non-goal: the
//! embedded SQL engine is opaque below the storage façade).

use rusqlite::Connection;

use crate::StorageError;

pub(crate) fn init(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS issues (
            id                  TEXT PRIMARY KEY,
            title               TEXT NOT NULL DEFAULT '',
            description         TEXT NOT NULL DEFAULT '',
            design              TEXT NOT NULL DEFAULT '',
            acceptance_criteria TEXT NOT NULL DEFAULT '',
            notes               TEXT NOT NULL DEFAULT '',
            status              TEXT NOT NULL DEFAULT 'open',
            priority            INTEGER NOT NULL DEFAULT 2,
            issue_type          TEXT NOT NULL DEFAULT 'task',
            assignee            TEXT,
            actor               TEXT,
            owner               TEXT,
            external_ref        TEXT,
            parent_id           TEXT,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            closed_at           TEXT,
            due_at              TEXT,
            defer_until         TEXT,
            is_tombstone        INTEGER NOT NULL DEFAULT 0,
            source_repo         TEXT,
            source_formula      TEXT,
            source_location     TEXT,
            prefix_override     TEXT
        );

        CREATE TABLE IF NOT EXISTS labels (
            issue_id TEXT NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
            label    TEXT NOT NULL,
            PRIMARY KEY (issue_id, label)
        );

        CREATE TABLE IF NOT EXISTS dependencies (
            from_id    TEXT NOT NULL,
            to_id      TEXT NOT NULL,
            dep_type   TEXT NOT NULL,
            created_at TEXT NOT NULL,
            created_by TEXT,
            metadata   TEXT,
            PRIMARY KEY (from_id, to_id, dep_type)
        );

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dirty_issues (
            issue_id   TEXT PRIMARY KEY,
            marked_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
        CREATE INDEX IF NOT EXISTS idx_issues_parent ON issues(parent_id);
        CREATE INDEX IF NOT EXISTS idx_dependencies_to ON dependencies(to_id);
        "#,
    )
    .map_err(|e| StorageError::sql("init_schema", e))
}
