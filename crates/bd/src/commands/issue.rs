// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd create` / `update` / `delete` / `get` / `search` / `label` /
//! `dependency` -- the issue CRUD surface (spec.md §6.2), each a thin
//! wrapper sending one [`beads_wire::Request`] to the workspace daemon.

use std::collections::BTreeMap;
use std::path::PathBuf;

use beads_core::DependencyType;
use beads_wire::{Request, ResponseBody, SearchFilter};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_issue, print_issues, OutputFormat};

#[derive(Args)]
pub struct CreateArgs {
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<i32>,
    #[arg(long)]
    pub issue_type: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub parent_id: Option<String>,
    #[arg(long, default_value = "cli")]
    pub actor: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<i32>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub parent_id: Option<String>,
    #[arg(long, default_value = "cli")]
    pub actor: String,
}

#[derive(Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub unassigned: bool,
    #[arg(long = "label")]
    pub labels: Vec<String>,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub overdue: bool,
    #[arg(long)]
    pub include_tombstones: bool,
}

#[derive(Subcommand)]
pub enum DependencyCommand {
    /// Adds a dependency edge
    Add {
        from_id: String,
        to_id: String,
        #[arg(long, default_value = "related")]
        dep_type: String,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Removes a dependency edge
    Remove {
        from_id: String,
        to_id: String,
        #[arg(long, default_value = "related")]
        dep_type: String,
    },
}

async fn client(beads_dir: &PathBuf, issue_prefix: &str) -> anyhow::Result<DaemonClient> {
    let socket_path = crate::client::socket_path_for(beads_dir);
    DaemonClient::connect_or_spawn(&socket_path, beads_dir, issue_prefix).await
}

pub async fn create(args: CreateArgs, beads_dir: PathBuf, issue_prefix: String, format: OutputFormat) -> anyhow::Result<()> {
    let mut fields = BTreeMap::new();
    if let Some(v) = args.description {
        fields.insert("description".into(), v.into());
    }
    if let Some(v) = args.priority {
        fields.insert("priority".into(), v.into());
    }
    if let Some(v) = args.issue_type {
        fields.insert("issue_type".into(), v.into());
    }
    if let Some(v) = args.assignee {
        fields.insert("assignee".into(), v.into());
    }
    if let Some(v) = args.parent_id {
        fields.insert("parent_id".into(), v.into());
    }

    let mut client = client(&beads_dir, &issue_prefix).await?;
    let body = client.send(Request::Create { title: args.title, fields, actor: args.actor }).await?;
    match body {
        ResponseBody::Issue(issue) => print_issue(&issue, format),
        _ => return Err(ExitError::general("daemon returned an unexpected response to create").into()),
    }
    Ok(())
}

pub async fn update(args: UpdateArgs, beads_dir: PathBuf, issue_prefix: String, format: OutputFormat) -> anyhow::Result<()> {
    let mut fields = BTreeMap::new();
    if let Some(v) = args.title {
        fields.insert("title".into(), v.into());
    }
    if let Some(v) = args.description {
        fields.insert("description".into(), v.into());
    }
    if let Some(v) = args.status {
        fields.insert("status".into(), v.into());
    }
    if let Some(v) = args.priority {
        fields.insert("priority".into(), v.into());
    }
    if let Some(v) = args.assignee {
        fields.insert("assignee".into(), v.into());
    }
    if let Some(v) = args.parent_id {
        fields.insert("parent_id".into(), v.into());
    }
    if fields.is_empty() {
        return Err(ExitError::general("update requires at least one --field to change").into());
    }

    let mut client = client(&beads_dir, &issue_prefix).await?;
    let body = client.send(Request::Update { id: args.id, fields, actor: args.actor }).await?;
    match body {
        ResponseBody::Issue(issue) => print_issue(&issue, format),
        _ => return Err(ExitError::general("daemon returned an unexpected response to update").into()),
    }
    Ok(())
}

pub async fn delete(id: String, actor: String, beads_dir: PathBuf, issue_prefix: String) -> anyhow::Result<()> {
    let mut client = client(&beads_dir, &issue_prefix).await?;
    client.send(Request::Delete { id, actor }).await?;
    println!("deleted");
    Ok(())
}

pub async fn get(id: String, beads_dir: PathBuf, issue_prefix: String, format: OutputFormat) -> anyhow::Result<()> {
    let mut client = client(&beads_dir, &issue_prefix).await?;
    match client.send(Request::Get { id: id.clone() }).await {
        Ok(ResponseBody::Issue(issue)) => {
            print_issue(&issue, format);
            Ok(())
        }
        Ok(_) => Err(ExitError::general("daemon returned an unexpected response to get").into()),
        Err(e) => Err(ExitError::not_found(format!("issue not found: {id} ({e})")).into()),
    }
}

pub async fn search(args: SearchArgs, beads_dir: PathBuf, issue_prefix: String, format: OutputFormat) -> anyhow::Result<()> {
    let filter = SearchFilter {
        status: args.status.map(Into::into),
        priority_min: None,
        priority_max: None,
        assignee: args.assignee,
        unassigned: args.unassigned,
        labels: args.labels.into_iter().collect(),
        issue_type: None,
        text: args.text,
        created_after: None,
        created_before: None,
        overdue: args.overdue,
        deferred: false,
        include_tombstones: args.include_tombstones,
    };

    let mut client = client(&beads_dir, &issue_prefix).await?;
    let body = client.send(Request::Search { filter }).await?;
    match body {
        ResponseBody::Issues(issues) => print_issues(&issues, format),
        _ => return Err(ExitError::general("daemon returned an unexpected response to search").into()),
    }
    Ok(())
}

pub async fn label(id: String, label: String, actor: String, beads_dir: PathBuf, issue_prefix: String) -> anyhow::Result<()> {
    let mut client = client(&beads_dir, &issue_prefix).await?;
    client.send(Request::AddLabel { id, label, actor }).await?;
    println!("labeled");
    Ok(())
}

pub async fn dependency(command: DependencyCommand, beads_dir: PathBuf, issue_prefix: String) -> anyhow::Result<()> {
    let mut client = client(&beads_dir, &issue_prefix).await?;
    match command {
        DependencyCommand::Add { from_id, to_id, dep_type, actor } => {
            client.send(Request::AddDependency { from_id, to_id, dep_type: DependencyType::from(dep_type), actor }).await?;
        }
        DependencyCommand::Remove { from_id, to_id, dep_type } => {
            client.send(Request::RemoveDependency { from_id, to_id, dep_type: DependencyType::from(dep_type) }).await?;
        }
    }
    println!("ok");
    Ok(())
}
