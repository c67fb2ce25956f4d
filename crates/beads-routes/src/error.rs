// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutesError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed route entry on line {line}: {source}")]
    Malformed { line: usize, source: serde_json::Error },
}
