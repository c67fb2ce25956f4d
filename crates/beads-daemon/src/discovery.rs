// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon discovery (spec.md §4.2): scan known roots for `*.sock`
//! candidates and probe each for liveness, cleaning up sockets with no
//! live holder.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;

/// A discovered socket and whether a daemon answered on it.
#[derive(Debug, Clone)]
pub struct DaemonCandidate {
    pub socket_path: PathBuf,
    pub alive: bool,
}

/// Scans `roots` (spec.md: "`home`, `/tmp`, current directory, plus
/// configured extras") for `*.sock` files one level deep and probes each.
pub async fn discover(roots: &[PathBuf]) -> Vec<DaemonCandidate> {
    let mut found = Vec::new();
    for root in roots {
        let Ok(entries) = std::fs::read_dir(root) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sock") {
                let alive = probe(&path).await;
                found.push(DaemonCandidate { socket_path: path, alive });
            }
        }
    }
    found
}

/// A socket answers liveness if a connection attempt succeeds within a
/// short timeout; anything else (refused, timed out, stale file) counts
/// as dead.
pub async fn probe(socket_path: &Path) -> bool {
    tokio::time::timeout(Duration::from_millis(200), UnixStream::connect(socket_path)).await.map(|r| r.is_ok()).unwrap_or(false)
}

/// Removes sockets discovered with no live holder (spec.md §4.2: "stale
/// sockets ... are cleaned up").
pub fn clean_stale(candidates: &[DaemonCandidate]) {
    for candidate in candidates.iter().filter(|c| !c.alive) {
        let _ = std::fs::remove_file(&candidate.socket_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn discover_finds_sock_files_and_marks_them_dead_without_a_listener() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("stale.sock"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let found = discover(&[dir.path().to_path_buf()]).await;
        assert_eq!(found.len(), 1);
        assert!(!found[0].alive);
    }

    #[tokio::test]
    async fn discover_marks_a_bound_socket_alive() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("bd.sock");
        let _listener = tokio::net::UnixListener::bind(&socket_path).unwrap();

        let found = discover(&[dir.path().to_path_buf()]).await;
        assert_eq!(found.len(), 1);
        assert!(found[0].alive);
    }

    #[tokio::test]
    async fn clean_stale_removes_only_dead_sockets() {
        let dir = tempdir().unwrap();
        let dead = dir.path().join("dead.sock");
        std::fs::write(&dead, b"").unwrap();
        let alive_path = dir.path().join("alive.sock");
        let _listener = tokio::net::UnixListener::bind(&alive_path).unwrap();

        let found = discover(&[dir.path().to_path_buf()]).await;
        clean_stale(&found);

        assert!(!dead.exists());
        assert!(alive_path.exists());
    }
}
