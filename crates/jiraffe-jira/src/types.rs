// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira REST v2 request and response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response of `GET /rest/api/2/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<ApiIssue>,
}

/// An issue as returned by search and get.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssue {
    pub key: String,
    pub fields: ApiFields,
}

/// The subset of issue fields jiraffe reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Named>,
    #[serde(default)]
    pub reporter: Option<ApiUser>,
    #[serde(default)]
    pub assignee: Option<ApiUser>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Creation timestamp, e.g. `2026-03-01T10:30:00.000+0300`.
    pub created: String,
}

/// Any `{"name": ...}` reference (priority, status).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Named {
    pub name: String,
}

impl Named {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Jira server user. Server deployments identify users by `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub name: String,
}

/// Response of `GET /rest/api/2/issue/{key}/transitions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<ApiTransition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTransition {
    pub id: String,
    pub name: String,
}

/// Body of `POST /rest/api/2/issue/{key}/transitions`.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRequest {
    pub transition: TransitionRef,
    pub fields: TransitionFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRef {
    pub id: String,
}

/// Fields updated together with the transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionFields {
    pub priority: Named,
    pub assignee: Named,
}

/// Error body Jira sends with 4xx/5xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default, rename = "errorMessages")]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: HashMap<String, String>,
}

impl ApiErrorResponse {
    /// Flattens all messages into one line.
    pub fn summary(&self) -> String {
        let mut parts = self.error_messages.clone();
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort();
        parts.extend(fields.into_iter().map(|(field, msg)| format!("{field}: {msg}")));
        parts.join("; ")
    }
}
