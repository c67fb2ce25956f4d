// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates a [`beads_wire::Request`] into storage façade calls and a
//! [`Response`], publishing any resulting mutation events on the bus only
//! after the underlying transaction has committed (spec.md §4.1).

use std::collections::BTreeMap;

use beads_core::{Dependency, Issue, IssueType, Status};
use beads_storage::{Filter, StorageError};
use beads_wire::{Request, Response, ResponseBody, SearchFilter};
use chrono::Utc;

use crate::lifecycle::DaemonState;
use crate::sqlite_update::fields_to_update;

pub async fn dispatch(daemon: &DaemonState, request: Request) -> Response {
    match handle(daemon, request) {
        Ok(body) => Response::ok(body),
        Err(e) => Response::err(e.to_string()),
    }
}

fn handle(daemon: &DaemonState, request: Request) -> Result<ResponseBody, StorageError> {
    let store = &daemon.store;
    let now = Utc::now();

    match request {
        Request::Create { title, fields, actor } => {
            let mut issue = Issue::new(String::new(), title, now);
            apply_fields(&mut issue, &fields);
            let (id, event) = store.run_in_transaction(|tx| tx.create_issue(issue, &actor, &daemon.config.issue_prefix))?;
            daemon.event_bus.publish(event);
            daemon.debouncer.trigger({
                let store = daemon.store.clone();
                let path = daemon.config.issues_jsonl_path.clone();
                move || export_now(&store, &path)
            });
            let issue = store.read(|tx| tx.get_issue(&id))?.expect("just created");
            Ok(ResponseBody::Issue(issue))
        }

        Request::Update { id, fields, actor } => {
            let update = fields_to_update(&fields);
            let events = store.run_in_transaction(|tx| tx.update_issue(&id, update, &actor, now))?;
            for event in events {
                daemon.event_bus.publish(event);
            }
            schedule_export(daemon);
            let issue = store.read(|tx| tx.get_issue(&id))?.ok_or(beads_core::CoreError::IssueNotFound(id))?;
            Ok(ResponseBody::Issue(issue))
        }

        Request::Delete { id, actor } => {
            let event = store.run_in_transaction(|tx| tx.delete_issue(&id, &actor, now))?;
            daemon.event_bus.publish(event);
            schedule_export(daemon);
            Ok(ResponseBody::Ack)
        }

        Request::Get { id } => {
            let issue = store.read(|tx| tx.get_issue(&id))?.ok_or(beads_core::CoreError::IssueNotFound(id))?;
            Ok(ResponseBody::Issue(issue))
        }

        Request::Search { filter } => {
            let issues = store.read(|tx| tx.search_issues(&to_storage_filter(filter), now))?;
            Ok(ResponseBody::Issues(issues))
        }

        Request::AddDependency { from_id, to_id, dep_type, actor } => {
            let dep = Dependency { from_id, to_id, dep_type, created_at: now, created_by: Some(actor), metadata: None };
            store.run_in_transaction(|tx| tx.add_dependency(dep))?;
            schedule_export(daemon);
            Ok(ResponseBody::Ack)
        }

        Request::RemoveDependency { from_id, to_id, dep_type } => {
            store.run_in_transaction(|tx| tx.remove_dependency(&from_id, &to_id, &dep_type, now))?;
            schedule_export(daemon);
            Ok(ResponseBody::Ack)
        }

        Request::AddLabel { id, label, actor } => {
            let event = store.run_in_transaction(|tx| tx.add_label(&id, &label, &actor, now))?;
            daemon.event_bus.publish(event);
            schedule_export(daemon);
            Ok(ResponseBody::Ack)
        }

        Request::GetConfig { key } => {
            let value = store.read(|tx| tx.get_config(&key))?;
            Ok(ResponseBody::ConfigValue(value))
        }

        Request::SetConfig { key, value } => {
            store.run_in_transaction(|tx| tx.set_config(&key, &value))?;
            Ok(ResponseBody::Ack)
        }

        Request::GetMutationsSince { since_ms } => {
            let events = daemon.event_bus.events_since(since_ms);
            Ok(ResponseBody::Mutations(events))
        }

        Request::SyncPause => {
            daemon.sync_paused.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(ResponseBody::Ack)
        }

        Request::SyncResume => {
            daemon.sync_paused.store(false, std::sync::atomic::Ordering::SeqCst);
            Ok(ResponseBody::Ack)
        }

        Request::Shutdown => {
            daemon.shutdown.cancel();
            Ok(ResponseBody::Ack)
        }
    }
}

fn schedule_export(daemon: &DaemonState) {
    let store = daemon.store.clone();
    let path = daemon.config.issues_jsonl_path.clone();
    daemon.debouncer.trigger(move || export_now(&store, &path));
}

fn export_now(store: &beads_storage::Store, path: &std::path::Path) {
    let result = store.read(|tx| {
        let mut issues = tx.search_issues(&Filter { include_tombstones: true, ..Default::default() }, Utc::now())?;
        beads_storage::jsonl::export_atomic(path, &mut issues)?;
        let dirty = tx.get_dirty_issues()?;
        tx.clear_dirty(&dirty)?;
        Ok::<_, StorageError>(())
    });
    if let Err(e) = result {
        tracing::warn!(error = %e, "deferred export failed");
    }
}

fn apply_fields(issue: &mut Issue, fields: &BTreeMap<String, serde_json::Value>) {
    if let Some(v) = fields.get("description").and_then(|v| v.as_str()) {
        issue.description = v.to_string();
    }
    if let Some(v) = fields.get("design").and_then(|v| v.as_str()) {
        issue.design = v.to_string();
    }
    if let Some(v) = fields.get("acceptance_criteria").and_then(|v| v.as_str()) {
        issue.acceptance_criteria = v.to_string();
    }
    if let Some(v) = fields.get("priority").and_then(|v| v.as_i64()) {
        issue.priority = v as i32;
    }
    if let Some(v) = fields.get("issue_type").and_then(|v| v.as_str()) {
        issue.issue_type = IssueType::from(v);
    }
    if let Some(v) = fields.get("assignee").and_then(|v| v.as_str()) {
        issue.assignee = Some(v.to_string());
    }
    if let Some(v) = fields.get("parent_id").and_then(|v| v.as_str()) {
        issue.parent_id = Some(v.to_string());
    }
    if let Some(v) = fields.get("status").and_then(|v| v.as_str()) {
        issue.status = Status::from(v);
    }
}

fn to_storage_filter(filter: SearchFilter) -> Filter {
    Filter {
        status: filter.status,
        priority_min: filter.priority_min,
        priority_max: filter.priority_max,
        assignee: filter.assignee,
        unassigned: filter.unassigned,
        labels: filter.labels,
        issue_type: filter.issue_type,
        text: filter.text,
        created_after: filter.created_after,
        created_before: filter.created_before,
        overdue: filter.overdue,
        deferred: filter.deferred,
        include_tombstones: filter.include_tombstones,
    }
}
