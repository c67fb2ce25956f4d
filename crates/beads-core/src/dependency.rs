// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency edges between issues (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DependencyType;

/// A directed edge `from -> to` of a given [`DependencyType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Type-specific payload, e.g. a serialized [`WaitsForMeta`] for
    /// `waits-for` edges. Opaque to everything but the type that owns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl Dependency {
    pub fn key(&self) -> (&str, &str, &DependencyType) {
        (&self.from_id, &self.to_id, &self.dep_type)
    }
}

/// `waits-for` gate kind (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitsForGate {
    AllChildren,
    AnyChildren,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitsForMeta {
    pub gate: WaitsForGate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawner_id: Option<String>,
}

/// Invariant 3: the dependency graph is simple -- no duplicate edges of
/// the same type between the same ordered pair.
pub fn has_duplicate(existing: &[Dependency], candidate: &Dependency) -> bool {
    existing.iter().any(|d| d.key() == candidate.key())
}
