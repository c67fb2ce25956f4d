// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The town-level routes file: `{Prefix -> Path}` mappings for each rig
//! (spec.md §4.9). Grounded on `beads-storage::jsonl`'s line-oriented
//! JSON-per-record shape -- one [`RouteEntry`] per line, no sorting
//! (`LoadRoutes` "returns them in file order").

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RoutesError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub prefix: String,
    pub path: PathBuf,
}

/// Reads `routes.jsonl` in file order (no re-sorting -- route precedence
/// is declaration order).
pub fn load_routes(path: impl AsRef<Path>) -> Result<Vec<RouteEntry>, RoutesError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut routes = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: RouteEntry = serde_json::from_str(&line).map_err(|source| RoutesError::Malformed { line: idx + 1, source })?;
        routes.push(entry);
    }
    Ok(routes)
}

/// Returns the rig name for `path`: the deepest route whose `path` is a
/// prefix of `path`, named by that route's final path component.
pub fn extract_project_from_path(routes: &[RouteEntry], path: &Path) -> Option<String> {
    routes
        .iter()
        .filter(|r| path.starts_with(&r.path))
        .max_by_key(|r| r.path.components().count())
        .and_then(|r| r.path.file_name())
        .map(|n| n.to_string_lossy().into_owned())
}
