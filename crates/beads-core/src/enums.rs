// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open-ended enums for the beads domain model.
//!
//! Workspaces may define custom statuses and dependency kinds (spec.md
//! §3), so each enum keeps a `Custom(String)` fallback rather than
//! rejecting unknown strings at the deserialization boundary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! open_enum {
    ($name:ident, default = $default:ident, [$(($variant:ident, $str:expr)),+ $(,)?]) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Custom(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $str,)+
                    Self::Custom(s) => s.as_str(),
                }
            }

            pub fn is_default(&self) -> bool {
                matches!(self, Self::$default)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($str => Self::$variant,)+
                    other => Self::Custom(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $($str => Self::$variant,)+
                    _ => Self::Custom(s),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                Ok(Self::from(String::deserialize(d)?))
            }
        }
    };
}

open_enum!(Status, default = Open, [
    (Open, "open"),
    (InProgress, "in_progress"),
    (Blocked, "blocked"),
    (Closed, "closed"),
]);

impl Status {
    /// Workspaces may register custom statuses via config (spec.md §3);
    /// the built-in four are always considered valid on their own.
    pub fn is_valid_with_custom(&self, custom: &[String]) -> bool {
        !matches!(self, Self::Custom(_)) || custom.iter().any(|c| c == self.as_str())
    }
}

open_enum!(IssueType, default = Task, [
    (Bug, "bug"),
    (Feature, "feature"),
    (Task, "task"),
    (Epic, "epic"),
    (Chore, "chore"),
    (Molecule, "molecule"),
    (Gate, "gate"),
    (Agent, "agent"),
    (Event, "event"),
]);

open_enum!(DependencyType, default = Related, [
    (Blocks, "blocks"),
    (Related, "related"),
    (ParentChild, "parent-child"),
    (DiscoveredFrom, "discovered-from"),
    (WaitsFor, "waits-for"),
    (Duplicates, "duplicates"),
]);
