// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin RPC client over the daemon's domain socket (spec.md §6.2),
//! grounded on `beads_wire`'s framing. `connect_or_spawn` implements
//! lazy daemon startup: the first command to touch a workspace starts
//! its daemon rather than requiring a separate `bd daemon start`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use beads_wire::{read_response, write_request, Request, Response, ResponseBody};
use tokio::net::UnixStream;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SPAWN_WAIT: Duration = Duration::from_secs(3);
const SPAWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    pub async fn connect(socket_path: &Path) -> std::io::Result<Self> {
        Ok(Self { stream: UnixStream::connect(socket_path).await? })
    }

    pub async fn connect_or_spawn(socket_path: &Path, beads_dir: &Path, issue_prefix: &str) -> anyhow::Result<Self> {
        if beads_daemon::discovery::probe(socket_path).await {
            return Ok(Self::connect(socket_path).await?);
        }

        spawn_background_daemon(beads_dir, issue_prefix)?;

        let deadline = tokio::time::Instant::now() + SPAWN_WAIT;
        loop {
            match Self::connect(socket_path).await {
                Ok(client) => return Ok(client),
                Err(e) => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(anyhow::anyhow!("daemon did not come up at {}: {e}", socket_path.display()));
                    }
                    tokio::time::sleep(SPAWN_POLL_INTERVAL).await;
                }
            }
        }
    }

    pub async fn send(&mut self, request: Request) -> anyhow::Result<ResponseBody> {
        write_request(&mut self.stream, &request).await?;
        let response: Response = read_response(&mut self.stream, REQUEST_TIMEOUT).await?;
        match response.result {
            Some(body) => Ok(body),
            None => Err(anyhow::anyhow!(response.error.unwrap_or_else(|| "daemon returned no result".into()))),
        }
    }
}

fn spawn_background_daemon(beads_dir: &Path, issue_prefix: &str) -> anyhow::Result<()> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .args(["daemon", "start", "--foreground"])
        .arg("--beads-dir")
        .arg(beads_dir)
        .arg("--issue-prefix")
        .arg(issue_prefix)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    Ok(())
}

pub fn socket_path_for(beads_dir: &Path) -> PathBuf {
    beads_dir.join("bd.sock")
}
