// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Storage-level errors (spec.md §7: "storage errors surface as typed
/// errors; corruption detected during open is reported and the
/// orchestrator may rebuild from JSONL").
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Core(#[from] beads_core::CoreError),

    #[error("sqlite error during {operation}: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    SqliteRow(#[from] rusqlite::Error),

    #[error("jsonl codec error at line {line}: {source}")]
    Jsonl {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage integrity check failed: {0}")]
    Corrupt(String),
}

impl StorageError {
    pub(crate) fn sql(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Sqlite { operation, source }
    }
}
