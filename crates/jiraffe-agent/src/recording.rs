// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder these calls
//! are no-ops.

use metrics::describe_counter;

/// Register all jiraffe metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "jiraffe_issues_notified_total",
        "Issues posted into a campus topic"
    );
    describe_counter!(
        "jiraffe_tracker_failures_total",
        "Failed tracker searches, by campus"
    );
    describe_counter!(
        "jiraffe_triage_completed_total",
        "Finished triage flows, by outcome"
    );
}

/// Record an issue posted to chat.
pub fn record_notified(campus: &str) {
    metrics::counter!("jiraffe_issues_notified_total", "campus" => campus.to_string())
        .increment(1);
}

/// Record a failed tracker search.
pub fn record_tracker_failure(campus: &str) {
    metrics::counter!("jiraffe_tracker_failures_total", "campus" => campus.to_string())
        .increment(1);
}

/// Record the last step of a triage flow.
pub fn record_triage_completed(outcome: &'static str) {
    metrics::counter!("jiraffe_triage_completed_total", "outcome" => outcome).increment(1);
}
