// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! beads-routes: town-level route table and rig aggregation (spec.md
//! §4.9) -- loading `routes.jsonl`, resolving a path to its owning rig,
//! discovering each rig's daemon, and merging activity across rigs.

pub mod activity;
pub mod discovery;
pub mod error;
pub mod routes;

pub use activity::{merge_activity, RigEvent};
pub use discovery::{active_daemon_count, discover_rig_daemons, RigHandle};
pub use error::RoutesError;
pub use routes::{extract_project_from_path, load_routes, RouteEntry};
