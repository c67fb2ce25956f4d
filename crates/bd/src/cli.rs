// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::activity::ActivityArgs;
use crate::commands::daemon::DaemonArgs;
use crate::commands::issue::{CreateArgs, DependencyCommand, SearchArgs, UpdateArgs};
use crate::commands::sync::SyncArgs;
use crate::commands::town::TownArgs;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "bd", version, about = "Beads: an issue-tracking substrate for agentic workflows", styles = crate::color::styles())]
pub struct Cli {
    /// Workspace `.beads` directory; defaults to the nearest one found
    /// by walking up from the current directory
    #[arg(long, global = true)]
    pub beads_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Issue ID prefix used only when this invocation creates a new
    /// workspace daemon (spec.md §6.1)
    #[arg(long, global = true, default_value = "bd")]
    pub issue_prefix: String,

    /// Town-level routes file (spec.md §4.9), used by `bd town`
    #[arg(long, global = true)]
    pub routes_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Creates a new issue
    Create(CreateArgs),
    /// Updates fields on an existing issue
    Update(UpdateArgs),
    /// Tombstones an issue
    Delete {
        id: String,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Fetches a single issue by ID
    Get { id: String },
    /// Searches issues by filter
    Search(SearchArgs),
    /// Adds a label to an issue
    Label {
        id: String,
        label: String,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Manages dependency edges between issues
    Dependency {
        #[command(subcommand)]
        command: DependencyCommand,
    },
    /// Tails this workspace's mutation event bus
    Activity(ActivityArgs),
    /// Daemon lifecycle: start, stop, status
    Daemon(DaemonArgs),
    /// Runs a sync cycle against the configured git remote
    Sync(SyncArgs),
    /// Cross-rig aggregation over the town-level routes file
    Town(TownArgs),
}

pub fn default_routes_file() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".beads").join("routes.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sync::ResolveStrategy;

    #[test]
    fn parses_create_with_fields() {
        let cli = Cli::parse_from(["bd", "create", "fix the bug", "--priority", "1", "--assignee", "alice"]);
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.title, "fix the bug");
                assert_eq!(args.priority, Some(1));
                assert_eq!(args.assignee.as_deref(), Some("alice"));
            }
            _ => panic!("expected Create"),
        }
    }

    #[test]
    fn parses_sync_resolve_flag() {
        let cli = Cli::parse_from(["bd", "sync", "--resolve", "theirs"]);
        match cli.command {
            Command::Sync(args) => assert_eq!(args.resolve, ResolveStrategy::Theirs),
            _ => panic!("expected Sync"),
        }
    }

    #[test]
    fn global_format_flag_applies_before_subcommand() {
        let cli = Cli::parse_from(["bd", "--format", "json", "get", "bd-1"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn daemon_start_subcommand_parses() {
        let cli = Cli::parse_from(["bd", "daemon", "start", "--foreground"]);
        match cli.command {
            Command::Daemon(args) => {
                assert!(matches!(args.command, crate::commands::daemon::DaemonCommand::Start { foreground: true, .. }));
            }
            _ => panic!("expected Daemon"),
        }
    }
}
