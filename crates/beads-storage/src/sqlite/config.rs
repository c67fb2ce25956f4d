// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-scoped key/value config (spec.md §4.1 `GetConfig`/`SetConfig`),
//! used for things like the custom status/label allow-lists that
//! [`beads_core::Status::is_valid_with_custom`] consults.

use rusqlite::{params, OptionalExtension};

use crate::error::StorageError;
use crate::sqlite::store::TxCtx;

impl<'a> TxCtx<'a> {
    pub fn get_config(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row("SELECT value FROM config WHERE key = ?1", params![key], |r| r.get(0))
            .optional()
            .map_err(|e| StorageError::sql("get_config", e))
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| StorageError::sql("set_config", e))?;
        Ok(())
    }

    pub fn delete_config(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM config WHERE key = ?1", params![key])
            .map_err(|e| StorageError::sql("delete_config", e))?;
        Ok(())
    }

    pub fn get_all_config(&self) -> Result<Vec<(String, String)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key, value FROM config ORDER BY key ASC")
            .map_err(|e| StorageError::sql("get_all_config", e))?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
            .map_err(|e| StorageError::sql("get_all_config", e))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| StorageError::sql("get_all_config", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::Store;

    #[test]
    fn set_then_get_round_trips() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.set_config("custom_statuses", "triage,review")).unwrap();
        let value = store.read(|tx| tx.get_config("custom_statuses")).unwrap();
        assert_eq!(value, Some("triage,review".to_string()));
    }

    #[test]
    fn set_overwrites_existing_key() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.set_config("k", "v1")).unwrap();
        store.run_in_transaction(|tx| tx.set_config("k", "v2")).unwrap();
        let value = store.read(|tx| tx.get_config("k")).unwrap();
        assert_eq!(value, Some("v2".to_string()));
    }

    #[test]
    fn delete_removes_key() {
        let store = Store::open_in_memory().unwrap();
        store.run_in_transaction(|tx| tx.set_config("k", "v")).unwrap();
        store.run_in_transaction(|tx| tx.delete_config("k")).unwrap();
        assert_eq!(store.read(|tx| tx.get_config("k")).unwrap(), None);
    }
}
