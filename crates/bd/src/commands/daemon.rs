// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd daemon` -- daemon lifecycle commands, implementing `killall`'s
//! three-stage shutdown escalation (spec.md §4.2/§5): an RPC shutdown
//! request, then `SIGTERM`, then `SIGKILL`, each bounded by the timeout
//! constants `beads_daemon::lifecycle` already defines for this purpose.

use std::path::PathBuf;

use beads_daemon::lifecycle::{FORCE_KILL_TIMEOUT, RPC_SHUTDOWN_TIMEOUT, SIGNAL_SHUTDOWN_TIMEOUT};
use beads_daemon::Config;
use beads_wire::Request;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Starts the daemon (foreground or detached background)
    Start {
        #[arg(long)]
        foreground: bool,
        #[arg(long)]
        beads_dir: Option<PathBuf>,
        #[arg(long, default_value = "bd")]
        issue_prefix: String,
    },
    /// Stops the daemon, escalating from RPC to signal to force-kill
    Stop,
    /// Reports whether a daemon is currently answering
    Status,
}

pub async fn daemon(args: DaemonArgs, beads_dir: PathBuf, issue_prefix: String) -> anyhow::Result<()> {
    match args.command {
        DaemonCommand::Start { foreground, beads_dir: override_dir, issue_prefix: override_prefix } => {
            let beads_dir = override_dir.unwrap_or(beads_dir);
            let issue_prefix = override_prefix;
            start(beads_dir, issue_prefix, foreground).await
        }
        DaemonCommand::Stop => stop(beads_dir).await,
        DaemonCommand::Status => status(beads_dir).await,
    }
}

async fn start(beads_dir: PathBuf, issue_prefix: String, foreground: bool) -> anyhow::Result<()> {
    if foreground {
        let mut config = Config::for_workspace(&beads_dir, issue_prefix);
        config.load_startup_overrides().map_err(|e| ExitError::general(format!("failed to load config.yaml: {e}")))?;
        init_tracing(&config.log_path);
        beads_daemon::run(config).await.map_err(|e| ExitError::general(format!("daemon exited with an error: {e}")))?;
        return Ok(());
    }

    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .args(["daemon", "start", "--foreground"])
        .arg("--beads-dir")
        .arg(&beads_dir)
        .arg("--issue-prefix")
        .arg(&issue_prefix)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    println!("daemon starting in the background for {}", beads_dir.display());
    Ok(())
}

async fn stop(beads_dir: PathBuf) -> anyhow::Result<()> {
    let socket_path = crate::client::socket_path_for(&beads_dir);
    let config = Config::for_workspace(&beads_dir, "bd");

    if let Ok(mut client) = DaemonClient::connect(&socket_path).await {
        let acked = tokio::time::timeout(RPC_SHUTDOWN_TIMEOUT, client.send(Request::Shutdown)).await;
        if matches!(acked, Ok(Ok(_))) {
            println!("daemon stopped");
            return Ok(());
        }
    }

    let Ok(pid_text) = std::fs::read_to_string(&config.lock_path) else {
        println!("no daemon lock found at {}", config.lock_path.display());
        return Ok(());
    };
    let Ok(pid) = pid_text.trim().parse::<u32>() else {
        return Err(ExitError::general(format!("malformed pid in {}", config.lock_path.display())).into());
    };

    let _ = std::process::Command::new("kill").arg("-TERM").arg(pid.to_string()).status();
    tokio::time::sleep(SIGNAL_SHUTDOWN_TIMEOUT).await;
    if !beads_daemon::discovery::probe(&socket_path).await {
        println!("daemon stopped");
        return Ok(());
    }

    let _ = std::process::Command::new("kill").arg("-KILL").arg(pid.to_string()).status();
    tokio::time::sleep(FORCE_KILL_TIMEOUT).await;
    println!("daemon force-killed");
    Ok(())
}

async fn status(beads_dir: PathBuf) -> anyhow::Result<()> {
    let socket_path = crate::client::socket_path_for(&beads_dir);
    let alive = beads_daemon::discovery::probe(&socket_path).await;
    if alive {
        println!("daemon is running ({})", socket_path.display());
    } else {
        println!("daemon is not running ({})", socket_path.display());
    }
    Ok(())
}

fn init_tracing(log_path: &std::path::Path) {
    use tracing_subscriber::EnvFilter;
    let _ = std::fs::create_dir_all(log_path.parent().unwrap_or(std::path::Path::new(".")));
    if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(log_path) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with_writer(file)
            .try_init();
    }
}
