// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `discoverRigDaemons` (spec.md §4.9): one handle per rig named in the
//! routes file, with a `None` client slot when that rig's daemon is not
//! running. Reuses `beads-daemon::discovery::probe` for the liveness
//! check against each rig's own `bd.sock`.

use std::path::PathBuf;

use crate::routes::RouteEntry;

/// One rig's resolved daemon presence. `socket_path` is always known
/// (derived from the route); `alive` records whether a daemon answered.
pub struct RigHandle {
    pub name: String,
    pub beads_dir: PathBuf,
    pub socket_path: PathBuf,
    pub alive: bool,
}

/// Probes every rig named in `routes` and returns one handle each,
/// regardless of whether its daemon is currently running.
pub async fn discover_rig_daemons(routes: &[RouteEntry]) -> Vec<RigHandle> {
    let mut handles = Vec::with_capacity(routes.len());
    for route in routes {
        let beads_dir = resolve_redirect(route.path.join(".beads"));
        let socket_path = beads_dir.join("bd.sock");
        let alive = beads_daemon::discovery::probe(&socket_path).await;
        handles.push(RigHandle { name: route.prefix.clone(), beads_dir, socket_path, alive });
    }
    handles
}

/// Follows a rig's `redirect` file, when present and pointing at an
/// existing directory, to the beads dir that actually owns its state
/// (spec.md §4.9).
fn resolve_redirect(beads_dir: PathBuf) -> PathBuf {
    match std::fs::read_to_string(beads_dir.join("redirect")) {
        Ok(target) if PathBuf::from(target.trim()).is_dir() => PathBuf::from(target.trim()),
        _ => beads_dir,
    }
}

pub fn active_daemon_count(handles: &[RigHandle]) -> usize {
    handles.iter().filter(|h| h.alive).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn rig_with_no_daemon_yields_a_dead_handle() {
        let dir = tempdir().unwrap();
        let routes = vec![RouteEntry { prefix: "bd".into(), path: dir.path().to_path_buf() }];
        let handles = discover_rig_daemons(&routes).await;
        assert_eq!(handles.len(), 1);
        assert!(!handles[0].alive);
        assert_eq!(active_daemon_count(&handles), 0);
    }

    #[tokio::test]
    async fn redirect_file_is_followed_to_the_real_beads_dir() {
        let real = tempdir().unwrap();
        let alias = tempdir().unwrap();
        let alias_beads = alias.path().join(".beads");
        std::fs::create_dir_all(&alias_beads).unwrap();
        std::fs::write(alias_beads.join("redirect"), real.path().to_string_lossy().as_bytes()).unwrap();

        let routes = vec![RouteEntry { prefix: "bd".into(), path: alias.path().to_path_buf() }];
        let handles = discover_rig_daemons(&routes).await;
        assert_eq!(handles[0].beads_dir, real.path());
    }

    #[tokio::test]
    async fn rig_with_a_bound_socket_yields_a_live_handle() {
        let dir = tempdir().unwrap();
        let beads_dir = dir.path().join(".beads");
        std::fs::create_dir_all(&beads_dir).unwrap();
        let _listener = tokio::net::UnixListener::bind(beads_dir.join("bd.sock")).unwrap();

        let routes = vec![RouteEntry { prefix: "bd".into(), path: dir.path().to_path_buf() }];
        let handles = discover_rig_daemons(&routes).await;
        assert!(handles[0].alive);
        assert_eq!(active_daemon_count(&handles), 1);
    }
}
