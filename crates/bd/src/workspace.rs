// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the `.beads` directory a CLI invocation operates against:
//! an explicit `--beads-dir`, or the nearest `.beads` found by walking
//! up from the current directory, followed through any `redirect` file
//! (spec.md §4.9) to the directory that actually owns the state.

use std::path::{Path, PathBuf};

pub fn resolve_beads_dir(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let base = match explicit {
        Some(p) => p,
        None => find_beads_dir(&std::env::current_dir()?)?,
    };
    Ok(follow_redirect(base))
}

/// Fallback for commands (`daemon start`) that are allowed to create a
/// workspace rather than requiring one to already exist.
pub fn default_beads_dir() -> PathBuf {
    std::env::current_dir().map(|d| d.join(".beads")).unwrap_or_else(|_| PathBuf::from(".beads"))
}

fn find_beads_dir(start: &Path) -> anyhow::Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(".beads");
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !dir.pop() {
            anyhow::bail!("no .beads directory found in {} or any parent directory", start.display());
        }
    }
}

fn follow_redirect(beads_dir: PathBuf) -> PathBuf {
    match std::fs::read_to_string(beads_dir.join("redirect")) {
        Ok(target) if PathBuf::from(target.trim()).is_dir() => PathBuf::from(target.trim()),
        _ => beads_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finds_beads_dir_in_a_parent() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join(".beads")).unwrap();
        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        let found = find_beads_dir(&nested).unwrap();
        assert_eq!(found, root.path().join(".beads"));
    }

    #[test]
    fn missing_beads_dir_is_an_error() {
        let root = tempdir().unwrap();
        assert!(find_beads_dir(root.path()).is_err());
    }

    #[test]
    fn redirect_file_is_followed() {
        let alias = tempdir().unwrap();
        let real = tempdir().unwrap();
        std::fs::write(alias.path().join("redirect"), real.path().to_string_lossy().as_bytes()).unwrap();
        assert_eq!(follow_redirect(alias.path().to_path_buf()), real.path());
    }
}
