// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd`: the command-line entry point to a workspace's beads daemon
//! (spec.md §6). Commands return `Result`, never call
//! `std::process::exit()` themselves -- `main()` is the single place
//! that maps an `ExitError` to a process exit code.

mod cli;
mod client;
mod color;
mod commands;
mod exit_error;
mod output;
mod workspace;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use exit_error::ExitError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ExitError>() {
            Some(exit_err) => {
                if !exit_err.message.is_empty() {
                    eprintln!("error: {}", exit_err.message);
                }
                std::process::exit(exit_err.code);
            }
            None => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let issue_prefix = cli.issue_prefix.clone();

    match cli.command {
        Command::Daemon(args) => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir).unwrap_or_else(|_| workspace::default_beads_dir());
            commands::daemon::daemon(args, beads_dir, issue_prefix).await
        }
        Command::Town(args) => {
            let routes_path = cli.routes_file.unwrap_or_else(cli::default_routes_file);
            commands::town::town(args, routes_path, format).await
        }
        Command::Create(args) => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::create(args, beads_dir, issue_prefix, format).await
        }
        Command::Update(args) => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::update(args, beads_dir, issue_prefix, format).await
        }
        Command::Delete { id, actor } => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::delete(id, actor, beads_dir, issue_prefix).await
        }
        Command::Get { id } => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::get(id, beads_dir, issue_prefix, format).await
        }
        Command::Search(args) => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::search(args, beads_dir, issue_prefix, format).await
        }
        Command::Label { id, label, actor } => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::label(id, label, actor, beads_dir, issue_prefix).await
        }
        Command::Dependency { command } => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::issue::dependency(command, beads_dir, issue_prefix).await
        }
        Command::Activity(args) => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::activity::activity(args, beads_dir, issue_prefix, format).await
        }
        Command::Sync(args) => {
            let beads_dir = workspace::resolve_beads_dir(cli.beads_dir)?;
            commands::sync::sync(args, beads_dir, issue_prefix, format).await
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();
}
