// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{BTreeMap, BTreeSet};

use beads_core::{DependencyType, IssueType, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request from a client to the per-workspace daemon (spec.md §6.2).
/// Each request is independent; the daemon serializes writes through
/// the storage façade but may process reads concurrently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum Request {
    Create {
        title: String,
        #[serde(default)]
        fields: BTreeMap<String, serde_json::Value>,
        actor: String,
    },
    Update {
        id: String,
        fields: BTreeMap<String, serde_json::Value>,
        actor: String,
    },
    Delete {
        id: String,
        actor: String,
    },
    Get {
        id: String,
    },
    Search {
        filter: SearchFilter,
    },
    AddDependency {
        from_id: String,
        to_id: String,
        dep_type: DependencyType,
        actor: String,
    },
    RemoveDependency {
        from_id: String,
        to_id: String,
        dep_type: DependencyType,
    },
    AddLabel {
        id: String,
        label: String,
        actor: String,
    },
    GetConfig {
        key: String,
    },
    SetConfig {
        key: String,
        value: String,
    },
    GetMutationsSince {
        since_ms: i64,
    },
    SyncPause,
    SyncResume,
    Shutdown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFilter {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority_min: Option<i32>,
    #[serde(default)]
    pub priority_max: Option<i32>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub unassigned: bool,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub issue_type: Option<IssueType>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub overdue: bool,
    #[serde(default)]
    pub deferred: bool,
    #[serde(default)]
    pub include_tombstones: bool,
}
