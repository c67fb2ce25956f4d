// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the wire protocol's untyped `fields` map (spec.md §6.2: "each
//! request carries a minimal argument record") onto storage's typed,
//! whole-field-replacement [`IssueUpdate`] patch.

use std::collections::BTreeMap;

use beads_core::{IssueType, Status};
use beads_storage::IssueUpdate;
use chrono::{DateTime, Utc};
use serde_json::Value;

fn string_field(fields: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn optional_string_field(fields: &BTreeMap<String, Value>, key: &str) -> Option<Option<String>> {
    fields.get(key).map(|v| if v.is_null() { None } else { v.as_str().map(str::to_string) })
}

fn timestamp_field(fields: &BTreeMap<String, Value>, key: &str) -> Option<Option<DateTime<Utc>>> {
    fields.get(key).map(|v| {
        if v.is_null() {
            None
        } else {
            v.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()).map(|d| d.with_timezone(&Utc))
        }
    })
}

pub fn fields_to_update(fields: &BTreeMap<String, Value>) -> IssueUpdate {
    IssueUpdate {
        title: string_field(fields, "title"),
        description: string_field(fields, "description"),
        design: string_field(fields, "design"),
        acceptance_criteria: string_field(fields, "acceptance_criteria"),
        notes: string_field(fields, "notes"),
        status: string_field(fields, "status").map(Status::from),
        priority: fields.get("priority").and_then(|v| v.as_i64()).map(|v| v as i32),
        issue_type: string_field(fields, "issue_type").map(IssueType::from),
        assignee: optional_string_field(fields, "assignee"),
        actor_field: optional_string_field(fields, "actor"),
        owner: optional_string_field(fields, "owner"),
        external_ref: optional_string_field(fields, "external_ref"),
        parent_id: optional_string_field(fields, "parent_id"),
        due_at: timestamp_field(fields, "due_at"),
        defer_until: timestamp_field(fields, "defer_until"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unspecified_fields_stay_none() {
        let fields = BTreeMap::new();
        let update = fields_to_update(&fields);
        assert!(update.title.is_none());
        assert!(update.assignee.is_none());
    }

    #[test]
    fn null_assignee_clears_it_rather_than_leaving_it_unchanged() {
        let mut fields = BTreeMap::new();
        fields.insert("assignee".to_string(), Value::Null);
        let update = fields_to_update(&fields);
        assert_eq!(update.assignee, Some(None));
    }

    #[test]
    fn status_string_maps_to_the_open_enum() {
        let mut fields = BTreeMap::new();
        fields.insert("status".to_string(), json!("in_progress"));
        let update = fields_to_update(&fields);
        assert_eq!(update.status, Some(Status::InProgress));
    }
}
