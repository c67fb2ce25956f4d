// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Town-scope activity streams (spec.md §4.9): merge per-rig mutation
//! events into one timeline, sorted the same way the bus orders events
//! within a single workspace (timestamp, tiebroken by sequence).

use beads_core::OrderedMutationEvent;
use serde::Serialize;

/// One rig's tag plus its event, so a merged town-scope stream can still
/// attribute each entry back to its origin.
#[derive(Debug, Clone, Serialize)]
pub struct RigEvent {
    pub rig: String,
    pub event: OrderedMutationEvent,
}

/// Merges per-rig event lists into one globally time-ordered stream.
/// Unlike a single workspace's bus, there is no shared `seq` counter
/// across rigs, so ties break on rig name for determinism.
pub fn merge_activity(per_rig: Vec<(String, Vec<OrderedMutationEvent>)>) -> Vec<RigEvent> {
    let mut merged: Vec<RigEvent> =
        per_rig.into_iter().flat_map(|(rig, events)| events.into_iter().map(move |event| RigEvent { rig: rig.clone(), event })).collect();
    merged.sort_by(|a, b| (a.event.sort_key(), &a.rig).cmp(&(b.event.sort_key(), &b.rig)));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::MutationEvent;
    use chrono::{Duration, Utc};

    fn ev(seq: u64, at: chrono::DateTime<Utc>) -> OrderedMutationEvent {
        OrderedMutationEvent { seq, event: MutationEvent::create("bd-1", "t", "a", at) }
    }

    #[test]
    fn merges_across_rigs_sorted_by_timestamp() {
        let t0 = Utc::now();
        let per_rig = vec![
            ("rig-a".to_string(), vec![ev(1, t0 + Duration::seconds(2))]),
            ("rig-b".to_string(), vec![ev(1, t0)]),
        ];
        let merged = merge_activity(per_rig);
        assert_eq!(merged[0].rig, "rig-b");
        assert_eq!(merged[1].rig, "rig-a");
    }

    #[test]
    fn ties_break_on_rig_name() {
        let t0 = Utc::now();
        let per_rig = vec![("rig-b".to_string(), vec![ev(1, t0)]), ("rig-a".to_string(), vec![ev(1, t0)])];
        let merged = merge_activity(per_rig);
        assert_eq!(merged[0].rig, "rig-a");
    }
}
