// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracker adapter trait for remote issue trackers (Jira).

use async_trait::async_trait;

use crate::error::JiraffeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Issue, Transition};

/// Adapter for the remote issue tracker.
///
/// Implementations map raw tracker payloads into [`Issue`]s. None of the
/// methods retry; a failed call is reported to the caller as is.
#[async_trait]
pub trait TrackerAdapter: PluginAdapter {
    /// Returns open issues carrying `label`, capped at the configured page size.
    ///
    /// The returned issues have `campus` set to `label`.
    async fn search_open_issues(&self, label: &str) -> Result<Vec<Issue>, JiraffeError>;

    /// Fetches one issue by key. Unknown keys yield [`JiraffeError::NotFound`].
    async fn get_issue(&self, key: &str) -> Result<Issue, JiraffeError>;

    /// Lists the workflow transitions currently available on an issue.
    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, JiraffeError>;

    /// Executes a transition, setting priority and assignee in the same request.
    async fn apply_transition(
        &self,
        key: &str,
        transition_id: &str,
        priority: &str,
        assignee: &str,
    ) -> Result<(), JiraffeError>;
}
