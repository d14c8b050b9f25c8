// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock tracker adapter for deterministic testing.
//!
//! `MockTracker` implements `TrackerAdapter` over an in-memory issue list.
//! Labels can be made to fail, and executed transitions are captured for
//! assertion in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use tokio::sync::Mutex;

use jiraffe_core::traits::adapter::PluginAdapter;
use jiraffe_core::traits::tracker::TrackerAdapter;
use jiraffe_core::types::{AdapterType, HealthStatus, Issue, Transition};
use jiraffe_core::JiraffeError;

/// A transition executed through [`MockTracker::apply_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub key: String,
    pub transition_id: String,
    pub priority: String,
    pub assignee: String,
}

/// The transition every issue added to a [`MockTracker`] starts with.
pub fn start_transition() -> Transition {
    Transition {
        id: "11".to_string(),
        name: "Start progress".to_string(),
    }
}

/// A plausible open issue labelled with `campus`.
pub fn sample_issue(key: &str, campus: &str) -> Issue {
    let created_at = FixedOffset::east_opt(3 * 3600)
        .and_then(|offset| offset.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).single())
        .expect("valid fixture timestamp");
    Issue {
        key: key.to_string(),
        link: format!("https://jira.example.com/browse/{key}"),
        priority: "Medium".to_string(),
        summary: format!("{key}: projector does not turn on"),
        description: "Nothing happens when the power button is pressed".to_string(),
        campus: campus.to_string(),
        labels: vec![campus.to_string()],
        reporter: "reporter".to_string(),
        assignee: "unassigned".to_string(),
        created_at,
        chat_message_id: None,
    }
}

/// An in-memory issue tracker.
///
/// Issues carry a single [`start_transition`] until it is applied, after
/// which the issue counts as in progress and offers no transitions.
pub struct MockTracker {
    issues: Mutex<Vec<Issue>>,
    transitions: Mutex<HashMap<String, Vec<Transition>>>,
    failing_labels: Mutex<HashSet<String>>,
    applied: Mutex<Vec<AppliedTransition>>,
    calls: AtomicUsize,
}

impl MockTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            issues: Mutex::new(Vec::new()),
            transitions: Mutex::new(HashMap::new()),
            failing_labels: Mutex::new(HashSet::new()),
            applied: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Add an open issue. Replaces any issue with the same key.
    pub async fn add_issue(&self, issue: Issue) {
        self.transitions
            .lock()
            .await
            .insert(issue.key.clone(), vec![start_transition()]);
        let mut issues = self.issues.lock().await;
        issues.retain(|i| i.key != issue.key);
        issues.push(issue);
    }

    /// Replace the transitions offered for `key`.
    pub async fn set_transitions(&self, key: &str, transitions: Vec<Transition>) {
        self.transitions
            .lock()
            .await
            .insert(key.to_string(), transitions);
    }

    /// Make searches for `label` fail with a tracker error.
    pub async fn fail_label(&self, label: &str) {
        self.failing_labels.lock().await.insert(label.to_string());
    }

    /// Make searches for `label` succeed again.
    pub async fn heal_label(&self, label: &str) {
        self.failing_labels.lock().await.remove(label);
    }

    /// All transitions executed so far, in order.
    pub async fn applied(&self) -> Vec<AppliedTransition> {
        self.applied.lock().await.clone()
    }

    /// Number of `TrackerAdapter` calls received.
    pub async fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTracker {
    fn name(&self) -> &str {
        "mock-tracker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Tracker
    }

    async fn health_check(&self) -> Result<HealthStatus, JiraffeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), JiraffeError> {
        Ok(())
    }
}

#[async_trait]
impl TrackerAdapter for MockTracker {
    async fn search_open_issues(&self, label: &str) -> Result<Vec<Issue>, JiraffeError> {
        self.count_call();
        if self.failing_labels.lock().await.contains(label) {
            return Err(JiraffeError::Tracker {
                message: format!("search for `{label}` failed"),
                status: Some(503),
                source: None,
            });
        }

        let issues = self.issues.lock().await;
        Ok(issues
            .iter()
            .filter(|i| i.labels.iter().any(|l| l == label))
            .map(|i| Issue {
                campus: label.to_string(),
                ..i.clone()
            })
            .collect())
    }

    async fn get_issue(&self, key: &str) -> Result<Issue, JiraffeError> {
        self.count_call();
        self.issues
            .lock()
            .await
            .iter()
            .find(|i| i.key == key)
            .cloned()
            .ok_or_else(|| JiraffeError::not_found("issue", key))
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, JiraffeError> {
        self.count_call();
        self.transitions
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| JiraffeError::not_found("issue", key))
    }

    async fn apply_transition(
        &self,
        key: &str,
        transition_id: &str,
        priority: &str,
        assignee: &str,
    ) -> Result<(), JiraffeError> {
        self.count_call();
        let mut transitions = self.transitions.lock().await;
        let available = transitions
            .get_mut(key)
            .ok_or_else(|| JiraffeError::not_found("issue", key))?;
        if !available.iter().any(|t| t.id == transition_id) {
            return Err(JiraffeError::Tracker {
                message: format!("transition {transition_id} is not available for {key}"),
                status: Some(400),
                source: None,
            });
        }
        available.clear();

        if let Some(issue) = self.issues.lock().await.iter_mut().find(|i| i.key == key) {
            issue.priority = priority.to_string();
            issue.assignee = assignee.to_string();
        }
        self.applied.lock().await.push(AppliedTransition {
            key: key.to_string(),
            transition_id: transition_id.to_string(),
            priority: priority.to_string(),
            assignee: assignee.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_filters_by_label() {
        let tracker = MockTracker::new();
        tracker.add_issue(sample_issue("SUP-1", "north")).await;
        tracker.add_issue(sample_issue("SUP-2", "south")).await;

        let found = tracker.search_open_issues("north").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "SUP-1");
        assert_eq!(found[0].campus, "north");
    }

    #[tokio::test]
    async fn failing_label_errors_until_healed() {
        let tracker = MockTracker::new();
        tracker.fail_label("north").await;
        assert!(tracker.search_open_issues("north").await.is_err());
        tracker.heal_label("north").await;
        assert!(tracker.search_open_issues("north").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn applying_start_consumes_it() {
        let tracker = MockTracker::new();
        tracker.add_issue(sample_issue("SUP-1", "north")).await;
        tracker
            .apply_transition("SUP-1", "11", "High", "alice")
            .await
            .unwrap();

        assert!(tracker.list_transitions("SUP-1").await.unwrap().is_empty());
        assert!(tracker.apply_transition("SUP-1", "11", "High", "alice").await.is_err());

        let issue = tracker.get_issue("SUP-1").await.unwrap();
        assert_eq!(issue.assignee, "alice");
        assert_eq!(tracker.applied().await.len(), 1);
        assert_eq!(tracker.calls().await, 4);
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let tracker = MockTracker::new();
        assert!(tracker.get_issue("SUP-9").await.unwrap_err().is_not_found());
    }
}
