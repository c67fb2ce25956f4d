// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use beads_core::{Issue, OrderedMutationEvent};
use beads_routes::RigEvent;
use chrono::Utc;
use clap::ValueEnum;

use crate::color::status_badge;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Relative time, e.g. "5s", "2m", "1h", "3d" -- used in text-mode listings.
pub fn format_time_ago(at: chrono::DateTime<Utc>) -> String {
    let elapsed = (Utc::now() - at).num_seconds().max(0);
    match elapsed {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

pub fn print_issue(issue: &Issue, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(issue).expect("issue serializes")),
        OutputFormat::Text => {
            println!("{} {} [{}]", issue.id, issue.title, status_badge(&issue.status));
            if let Some(assignee) = &issue.assignee {
                println!("  assignee: {assignee}");
            }
            if !issue.labels.is_empty() {
                println!("  labels: {}", issue.labels.iter().cloned().collect::<Vec<_>>().join(", "));
            }
            println!("  updated {} ago", format_time_ago(issue.updated_at));
        }
    }
}

pub fn print_issues(issues: &[Issue], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(issues).expect("issues serialize")),
        OutputFormat::Text => {
            if issues.is_empty() {
                println!("no issues found");
                return;
            }
            for issue in issues {
                println!("{}  {:<12} {:<8} {}", issue.id, status_badge(&issue.status), issue.priority, issue.title);
            }
            println!("\n{} issue(s)", issues.len());
        }
    }
}

pub fn print_mutations(events: &[OrderedMutationEvent], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(events).expect("events serialize")),
        OutputFormat::Text => {
            for e in events {
                println!("[{}] {:?} {} ({})", e.event.timestamp.format("%H:%M:%S"), e.event.event_type, e.event.issue_id, e.seq);
            }
        }
    }
}

pub fn print_rig_events(events: &[RigEvent], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(events).expect("events serialize")),
        OutputFormat::Text => {
            for e in events {
                println!("[{}] {:<12} {:?} {}", e.event.event.timestamp.format("%H:%M:%S"), e.rig, e.event.event.event_type, e.event.event.issue_id);
            }
        }
    }
}
