// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use beads_core::{Issue, OrderedMutationEvent};
use serde::{Deserialize, Serialize};

/// Response from the daemon back to a client. Every request gets exactly
/// one response; `error` is set instead of `result` on failure so the
/// framing stays uniform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResponseBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(body: ResponseBody) -> Self {
        Self { result: Some(body), error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { result: None, error: Some(message.into()) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Issue(Issue),
    Issues(Vec<Issue>),
    Mutations(Vec<OrderedMutationEvent>),
    ConfigValue(Option<String>),
    Ack,
    Text(String),
}
