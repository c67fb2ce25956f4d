// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd activity` -- tails this workspace's mutation event bus (spec.md
//! §3, §6.2: `GetMutationsSince`), optionally polling for new events.

use std::path::PathBuf;
use std::time::Duration;

use beads_wire::{Request, ResponseBody};
use clap::Args;

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_mutations, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct ActivityArgs {
    #[arg(long, default_value_t = 0)]
    pub since_ms: i64,
    #[arg(long)]
    pub follow: bool,
}

pub async fn activity(args: ActivityArgs, beads_dir: PathBuf, issue_prefix: String, format: OutputFormat) -> anyhow::Result<()> {
    let socket_path = crate::client::socket_path_for(&beads_dir);
    let mut client = DaemonClient::connect_or_spawn(&socket_path, &beads_dir, &issue_prefix).await?;

    let mut since_ms = args.since_ms;
    loop {
        let body = client.send(Request::GetMutationsSince { since_ms }).await?;
        let events = match body {
            ResponseBody::Mutations(events) => events,
            _ => return Err(ExitError::general("daemon returned an unexpected response to GetMutationsSince").into()),
        };
        if let Some(last) = events.last() {
            // `events_since` is inclusive, so advance one millisecond past
            // the last event's own timestamp -- otherwise the next poll
            // would re-deliver it forever.
            since_ms = last.event.timestamp.timestamp_millis() + 1;
        }
        print_mutations(&events, format);

        if !args.follow {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
