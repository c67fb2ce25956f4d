// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across crates (spec.md §7). Each variant maps
//! to one of the six kinds named in the spec: precondition, environment,
//! transient I/O, conflict, corruption, fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid issue id '{0}': must match <prefix>-<suffix>")]
    InvalidIssueId(String),

    #[error("prefix '{given}' is not the workspace prefix or an allowed prefix")]
    PrefixNotAllowed { given: String },

    #[error("issue '{0}' already exists")]
    IssueExists(String),

    #[error("issue '{0}' not found")]
    IssueNotFound(String),

    #[error("duplicate dependency edge {from} -> {to} ({dep_type})")]
    DuplicateDependency { from: String, to: String, dep_type: String },

    #[error("invalid status '{status}': not a known or workspace-registered custom status")]
    InvalidStatus { status: String },
}
