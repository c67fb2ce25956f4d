// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd town` -- cross-rig aggregation (spec.md §4.9): which rigs have a
//! live daemon, and a merged activity stream across all of them.

use std::path::PathBuf;

use beads_routes::{discover_rig_daemons, load_routes, merge_activity};
use beads_wire::{Request, ResponseBody};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{print_rig_events, OutputFormat};

#[derive(Args)]
pub struct TownArgs {
    #[command(subcommand)]
    pub command: TownCommand,
}

#[derive(Subcommand)]
pub enum TownCommand {
    /// Lists every rig in the routes file and whether its daemon is alive
    Status,
    /// Merges mutation activity across every rig with a live daemon
    Activity {
        #[arg(long, default_value_t = 0)]
        since_ms: i64,
    },
}

pub async fn town(args: TownArgs, routes_path: PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let routes = load_routes(&routes_path)?;

    match args.command {
        TownCommand::Status => {
            let handles = discover_rig_daemons(&routes).await;
            match format {
                OutputFormat::Json => {
                    let rows: Vec<_> = handles
                        .iter()
                        .map(|h| serde_json::json!({"name": h.name, "beads_dir": h.beads_dir, "alive": h.alive}))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                OutputFormat::Text => {
                    for h in &handles {
                        println!("{:<16} {:<8} {}", h.name, if h.alive { "up" } else { "down" }, h.beads_dir.display());
                    }
                }
            }
        }
        TownCommand::Activity { since_ms } => {
            let handles = discover_rig_daemons(&routes).await;
            let mut per_rig = Vec::new();
            for handle in handles.iter().filter(|h| h.alive) {
                if let Ok(mut client) = DaemonClient::connect(&handle.socket_path).await {
                    if let Ok(ResponseBody::Mutations(events)) = client.send(Request::GetMutationsSince { since_ms }).await {
                        per_rig.push((handle.name.clone(), events));
                    }
                }
            }
            let merged = merge_activity(per_rig);
            print_rig_events(&merged, format);
        }
    }
    Ok(())
}
