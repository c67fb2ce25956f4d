// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd sync` -- runs one sync cycle through `beads_sync::SyncOrchestrator`
//! and, when the merge leaves conflicts, applies `--resolve` (spec.md
//! §4.5). `manual` leaves the recorded conflicts in place and reports a
//! non-zero exit so the caller knows to resolve them interactively.

use std::path::{Path, PathBuf};

use beads_core::sync_state::ConflictResolution;
use beads_core::{Issue, SystemClock};
use beads_merge::MergeStrategy;
use beads_storage::{Filter, Store};
use beads_sync::conflicts::{resolve_non_interactive, ConflictStore};
use beads_sync::{SyncOrchestrator, SyncReport, WorkspacePaths};
use clap::{Args, ValueEnum};

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum ResolveStrategy {
    #[default]
    Newest,
    Ours,
    Theirs,
    Manual,
}

impl From<ResolveStrategy> for ConflictResolution {
    fn from(s: ResolveStrategy) -> Self {
        match s {
            ResolveStrategy::Newest => ConflictResolution::Newest,
            ResolveStrategy::Ours => ConflictResolution::Ours,
            ResolveStrategy::Theirs => ConflictResolution::Theirs,
            ResolveStrategy::Manual => ConflictResolution::Manual,
        }
    }
}

#[derive(Args)]
pub struct SyncArgs {
    /// Export and push the local snapshot without pulling remote first
    #[arg(long)]
    pub no_pull: bool,
    /// Only apply the remote's `issues.jsonl` into local storage, no push
    #[arg(long)]
    pub import_only: bool,
    /// Write `issues.jsonl` from storage without touching git at all
    #[arg(long)]
    pub flush: bool,
    /// Never push, even on a clean merge (used by `--no-pull` dry runs)
    #[arg(long)]
    pub no_push: bool,
    #[arg(long, value_enum, default_value_t = ResolveStrategy::Newest)]
    pub resolve: ResolveStrategy,
    /// Preview the three-way merge against the last sync base and the
    /// on-disk `issues.jsonl` without touching git, storage, or the
    /// conflict file
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn sync(args: SyncArgs, beads_dir: PathBuf, issue_prefix: String, format: OutputFormat) -> anyhow::Result<()> {
    let paths = WorkspacePaths::for_workspace(&beads_dir).resolve_redirect();
    let store = Store::open(&paths.db_path)?;

    if args.dry_run {
        return preview(&paths, &store, format);
    }

    let repo_root = find_git_root(&paths.beads_dir)
        .ok_or_else(|| ExitError::general(format!("no git repository found above {}", paths.beads_dir.display())))?;

    let mut config = beads_daemon::Config::for_workspace(&paths.beads_dir, issue_prefix);
    let _ = config.load_startup_overrides();

    let orchestrator = SyncOrchestrator {
        paths: paths.clone(),
        repo_root,
        sync_branch: load_sync_branch(&config.config_yaml_path),
        suppress_push: args.no_push,
        clock: SystemClock,
    };

    let report = if args.flush {
        orchestrator.flush_only(&store)?;
        SyncReport::default()
    } else if args.import_only {
        orchestrator.import_only(&store)?
    } else if args.no_pull {
        orchestrator.export_only(&store).await?
    } else {
        orchestrator.full(&store).await?
    };

    if report.conflict_count > 0 {
        if args.resolve == ResolveStrategy::Manual {
            print_report(&report, format);
            return Err(ExitError::general(format!(
                "{} conflict(s) need manual resolution -- see {}",
                report.conflict_count,
                paths.sync_conflicts_path.display()
            ))
            .into());
        }
        apply_resolution(&paths, &store, args.resolve.into())?;
    }

    print_report(&report, format);
    Ok(())
}

/// Runs the merge engine directly against the last sync base and the
/// currently-exported `issues.jsonl`, without pulling, pushing, or
/// writing anything -- lets an operator see how many conflicts a real
/// sync would produce before picking a `--resolve` strategy.
fn preview(paths: &WorkspacePaths, store: &Store, format: OutputFormat) -> anyhow::Result<()> {
    let base = if paths.sync_base_path.exists() { Some(beads_storage::jsonl::import(&paths.sync_base_path)?) } else { None };
    let remote = if paths.issues_jsonl_path.exists() { beads_storage::jsonl::import(&paths.issues_jsonl_path)? } else { Vec::new() };
    let local = store.read(|tx| tx.search_issues(&Filter { include_tombstones: true, ..Filter::default() }, chrono::Utc::now()))?;

    let result = beads_merge::merge(base.as_deref(), &local, &remote);
    let remote_changes = result.issues.iter().filter(|m| m.strategy == MergeStrategy::Remote).count();
    let merged = result.issues.iter().filter(|m| m.strategy == MergeStrategy::Merged).count();

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "issues": result.issues.len(),
                "conflict_count": result.conflict_count,
                "remote_changes": remote_changes,
                "merged": merged,
            })
        ),
        OutputFormat::Text => {
            println!("dry run: {} issue(s), {} would conflict, {} remote-only change(s)", result.issues.len(), result.conflict_count, remote_changes);
        }
    }
    Ok(())
}

fn apply_resolution(paths: &WorkspacePaths, store: &Store, strategy: ConflictResolution) -> anyhow::Result<()> {
    let conflicts = ConflictStore::new(&paths.sync_conflicts_path);
    for conflict in conflicts.load()? {
        let local: Issue = serde_json::from_str(&conflict.local_version)?;
        let remote: Issue = serde_json::from_str(&conflict.remote_version)?;
        let merged = store.read(|tx| tx.get_issue(&conflict.issue_id))?.unwrap_or_else(|| local.clone());
        let resolved = resolve_non_interactive(strategy.clone(), &local, &remote, &merged)?;
        store.run_in_transaction(|tx| tx.replace_issue(&resolved))?;
        conflicts.clear_resolved(&conflict.issue_id)?;
    }
    Ok(())
}

fn print_report(report: &SyncReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({
            "conflict_count": report.conflict_count,
            "pushed": report.pushed,
            "warnings": report.warnings,
        })),
        OutputFormat::Text => {
            println!("sync complete: {} conflict(s), pushed={}", report.conflict_count, report.pushed);
            for w in &report.warnings {
                println!("warning: {w}");
            }
        }
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(".git").exists() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

fn load_sync_branch(config_yaml_path: &Path) -> Option<String> {
    use figment::providers::{Format, Yaml};
    use figment::Figment;

    #[derive(serde::Deserialize, Default)]
    struct Settings {
        sync_branch: Option<String>,
    }

    Figment::new().merge(Yaml::file(config_yaml_path)).extract::<Settings>().ok().and_then(|s| s.sync_branch)
}
