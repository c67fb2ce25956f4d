// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutation events (spec.md §3) -- the record published on the daemon's
//! mutation event bus and tailed by follow-mode consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    Create,
    Update,
    Delete,
    Comment,
    Status,
    Bonded,
    Squashed,
    Burned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: MutationType,
    pub issue_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_count: Option<u32>,
}

impl MutationEvent {
    pub fn create(issue_id: impl Into<String>, title: impl Into<String>, actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            event_type: MutationType::Create,
            issue_id: issue_id.into(),
            title: Some(title.into()),
            actor: Some(actor.into()),
            assignee: None,
            old_status: None,
            new_status: None,
            parent_id: None,
            step_count: None,
        }
    }

    pub fn status_change(issue_id: impl Into<String>, actor: impl Into<String>, old: Status, new: Status, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            event_type: MutationType::Status,
            issue_id: issue_id.into(),
            title: None,
            actor: Some(actor.into()),
            assignee: None,
            old_status: Some(old),
            new_status: Some(new),
            parent_id: None,
            step_count: None,
        }
    }
}

/// Global ordering (spec.md §5): by timestamp, tiebroken by insertion
/// sequence. `seq` is assigned by the bus at publish time, never by the
/// caller, so two events with identical wall-clock timestamps still sort
/// deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderedMutationEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub event: MutationEvent,
}

impl OrderedMutationEvent {
    pub fn sort_key(&self) -> (DateTime<Utc>, u64) {
        (self.event.timestamp, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_tiebreaks_on_sequence() {
        let t = Utc::now();
        let a = OrderedMutationEvent { seq: 1, event: MutationEvent::create("bd-1", "a", "x", t) };
        let b = OrderedMutationEvent { seq: 2, event: MutationEvent::create("bd-2", "b", "x", t) };
        let mut events = vec![b.clone(), a.clone()];
        events.sort_by_key(|e| e.sort_key());
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[1].seq, 2);
    }
}
