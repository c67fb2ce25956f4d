// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Store`] owns the single sqlite connection for a workspace and
//! enforces the façade's transactional guarantees. Writes are serialized
//! through `conn`'s mutex (spec.md §5); reads take the same lock today,
//! which is the one place this implementation trades the spec's "reads
//! are concurrent" language for simplicity -- see DESIGN.md.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::StorageError;
use crate::sqlite::schema;

/// The transactional storage façade for one workspace's `beads.db`.
pub struct Store {
    conn: Mutex<Connection>,
}

/// A handle into an open transaction. Everything that mutates or reads
/// rows goes through a `&TxCtx`, which is only ever produced inside
/// [`Store::run_in_transaction`]. [`TxCtx::nested`] lets call sites
/// compose multi-step operations (e.g. import) without starting a second
/// `BEGIN` -- nested calls are flattened to the single outer transaction
/// (spec.md §4.1).
pub struct TxCtx<'a> {
    pub(crate) conn: &'a Connection,
}

impl Store {
    /// Opens (creating if absent) the sqlite database at `path` and
    /// ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::sql("open", e))?;
        schema::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store, used by tests and by `doctor --fix` while
    /// rebuilding from JSONL before it is persisted.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::sql("open_in_memory", e))?;
        schema::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Runs `f` inside a single sqlite transaction, committing on `Ok`
    /// and rolling back on `Err`. Every public CRUD method on [`Store`]
    /// is a thin wrapper around this.
    pub fn run_in_transaction<T>(
        &self,
        f: impl FnOnce(&TxCtx) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN IMMEDIATE").map_err(|e| StorageError::sql("begin", e))?;
        let ctx = TxCtx { conn: &conn };
        match f(&ctx) {
            Ok(value) => {
                conn.execute_batch("COMMIT").map_err(|e| StorageError::sql("commit", e))?;
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Runs a read-only query without the overhead of a write
    /// transaction. Still serialized behind the connection mutex.
    pub fn read<T>(&self, f: impl FnOnce(&TxCtx) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let conn = self.conn.lock();
        let ctx = TxCtx { conn: &conn };
        f(&ctx)
    }

    /// A cheap integrity probe used by `doctor` (spec.md §7 corruption
    /// handling): a failing `PRAGMA integrity_check` means the
    /// orchestrator should offer to rebuild from JSONL.
    pub fn integrity_check(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| StorageError::sql("integrity_check", e))?;
        if result == "ok" {
            Ok(())
        } else {
            Err(StorageError::Corrupt(result))
        }
    }
}

impl<'a> TxCtx<'a> {
    /// Flattens nested transactional work into the currently-open
    /// transaction (spec.md §4.1: "nested calls are flattened to a
    /// single outer transaction").
    pub fn nested<T>(&self, f: impl FnOnce(&TxCtx) -> Result<T, StorageError>) -> Result<T, StorageError> {
        f(self)
    }
}

pub(crate) fn now_rfc3339(now: DateTime<Utc>) -> String {
    now.to_rfc3339()
}

pub(crate) fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_in_transaction_commits_on_ok() {
        let store = Store::open_in_memory().unwrap();
        store
            .run_in_transaction(|tx| {
                tx.conn.execute("INSERT INTO config(key, value) VALUES ('k', 'v')", [])
                    .map_err(|e| StorageError::sql("insert", e))?;
                Ok(())
            })
            .unwrap();

        let count: i64 = store
            .read(|tx| {
                tx.conn
                    .query_row("SELECT COUNT(*) FROM config", [], |r| r.get(0))
                    .map_err(|e| StorageError::sql("count", e))
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn run_in_transaction_rolls_back_on_err() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<(), StorageError> = store.run_in_transaction(|tx| {
            tx.conn.execute("INSERT INTO config(key, value) VALUES ('k', 'v')", [])
                .map_err(|e| StorageError::sql("insert", e))?;
            Err(StorageError::Corrupt("forced".into()))
        });
        assert!(result.is_err());

        let count: i64 = store
            .read(|tx| {
                tx.conn
                    .query_row("SELECT COUNT(*) FROM config", [], |r| r.get(0))
                    .map_err(|e| StorageError::sql("count", e))
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn nested_reuses_the_outer_transaction() {
        let store = Store::open_in_memory().unwrap();
        store
            .run_in_transaction(|tx| {
                tx.conn.execute("INSERT INTO config(key, value) VALUES ('a', '1')", [])
                    .map_err(|e| StorageError::sql("insert", e))?;
                tx.nested(|tx2| {
                    tx2.conn.execute("INSERT INTO config(key, value) VALUES ('b', '2')", [])
                        .map_err(|e| StorageError::sql("insert", e))?;
                    Ok(())
                })
            })
            .unwrap();

        let count: i64 = store
            .read(|tx| {
                tx.conn
                    .query_row("SELECT COUNT(*) FROM config", [], |r| r.get(0))
                    .map_err(|e| StorageError::sql("count", e))
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn integrity_check_passes_on_fresh_store() {
        let store = Store::open_in_memory().unwrap();
        store.integrity_check().unwrap();
    }
}
