// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! beads-storage: the transactional, typed façade over the embedded row
//! store (spec.md §4.1). The underlying SQL engine is treated as an
//! opaque key/row store with transactions -- every query in this crate
//! goes through [`rusqlite`] but nothing above this crate should know
//! that.

mod error;
pub mod jsonl;
mod sqlite;

pub use error::StorageError;
pub use sqlite::issues::IssueUpdate;
pub use sqlite::search::Filter;
pub use sqlite::store::{Store, TxCtx};
