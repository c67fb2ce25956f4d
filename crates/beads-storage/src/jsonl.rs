// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical JSONL export/import (spec.md §9 open question: byte-stable
//! output). This implementation resolves it by writing one [`Issue`] per
//! line, sorted by `id` ascending, in the struct's declared field order,
//! LF-terminated, with a trailing newline -- see DESIGN.md.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use beads_core::Issue;

use crate::error::StorageError;

/// Atomically (write-tmp, fsync, rename) writes `issues` as canonical
/// JSONL, sorted by id. Used by the deferred export scheduler (spec.md
/// §4.7) and by `bd export`.
pub fn export_atomic(path: impl AsRef<Path>, issues: &mut [Issue]) -> Result<(), StorageError> {
    issues.sort_by(|a, b| a.id.cmp(&b.id));

    let path = path.as_ref();
    let tmp_path = path.with_extension("jsonl.tmp");

    let mut file = fs::File::create(&tmp_path)?;
    for issue in issues.iter() {
        let line = serde_json::to_string(issue).map_err(|source| StorageError::Jsonl { line: 0, source })?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads a JSONL export back into memory. Malformed lines surface the
/// 1-based line number so `doctor` can point at the exact corrupt
/// record (spec.md §7).
pub fn import(path: impl AsRef<Path>) -> Result<Vec<Issue>, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut issues = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let issue: Issue = serde_json::from_str(&line).map_err(|source| StorageError::Jsonl { line: idx + 1, source })?;
        issues.push(issue);
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn export_sorts_by_id_and_import_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        let mut issues = vec![Issue::new("bd-2", "second", now()), Issue::new("bd-1", "first", now())];
        export_atomic(&path, &mut issues).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert!(lines[0].contains("\"bd-1\""));
        assert!(lines[1].contains("\"bd-2\""));

        let imported = import(&path).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].id, "bd-1");
    }

    #[test]
    fn export_is_deterministic_across_runs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        let mut a = vec![Issue::new("bd-2", "t", now()), Issue::new("bd-1", "t", now())];
        let mut b = vec![Issue::new("bd-1", "t", now()), Issue::new("bd-2", "t", now())];
        export_atomic(&path, &mut a).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        export_atomic(&path, &mut b).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn import_reports_line_number_on_corrupt_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");
        let mut valid = vec![Issue::new("bd-1", "t", now())];
        export_atomic(&path, &mut valid).unwrap();
        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push_str("not json\n");
        fs::write(&path, contents).unwrap();

        let err = import(&path).unwrap_err();
        match err {
            StorageError::Jsonl { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Jsonl error, got {other:?}"),
        }
    }
}
