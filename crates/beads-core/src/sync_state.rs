// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync-state and sync-conflict records (spec.md §3, §4.8). Persistence
//! lives in `beads-sync`; this crate only owns the shapes so both the
//! daemon and the sync orchestrator can share them without a crate cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub needs_manual_sync: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    Newest,
    Ours,
    Theirs,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConflict {
    pub issue_id: String,
    pub reason: String,
    pub local_version: String,
    pub remote_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_strategy: Option<ConflictResolution>,
}
