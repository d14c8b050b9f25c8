// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira tracker adapter for jiraffe.
//!
//! This crate implements [`TrackerAdapter`] on top of the Jira REST v2 API:
//! label-scoped JQL search, single-issue fetch, and the combined
//! transition + field update used when triage completes.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use jiraffe_config::model::JiraConfig;
use jiraffe_config::parse_utc_offset;
use jiraffe_core::{
    AdapterType, HealthStatus, Issue, JiraffeError, PluginAdapter, TrackerAdapter, Transition,
};
use tracing::{debug, info, warn};

use crate::client::JiraClient;
use crate::types::{ApiIssue, Named, TransitionFields, TransitionRef, TransitionRequest};

/// Format of Jira's `created` field.
const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Jira tracker implementing [`TrackerAdapter`].
pub struct JiraTracker {
    client: JiraClient,
    project: String,
    open_status: String,
    page_size: u32,
    offset: FixedOffset,
}

impl JiraTracker {
    /// Creates a tracker from the `[jira]` config section.
    ///
    /// `base_url` and `api_token` are required here even though config
    /// validation lets them be absent.
    pub fn new(config: &JiraConfig) -> Result<Self, JiraffeError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| JiraffeError::Config("jira.base_url is not set".into()))?;
        let api_token = config
            .api_token
            .as_deref()
            .ok_or_else(|| JiraffeError::Config("jira.api_token is not set".into()))?;
        let offset = parse_utc_offset(&config.utc_offset)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                JiraffeError::Config(format!("invalid jira.utc_offset `{}`", config.utc_offset))
            })?;

        let client = JiraClient::new(
            base_url,
            api_token,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        info!(
            base_url,
            project = config.project,
            "Jira tracker initialized"
        );

        Ok(Self {
            client,
            project: config.project.clone(),
            open_status: config.open_status.clone(),
            page_size: config.page_size,
            offset,
        })
    }

    /// JQL selecting open issues of the project carrying `label`.
    fn open_issues_jql(&self, label: &str) -> String {
        format!(
            "project = {} AND Status = \"{}\" AND Labels = \"{}\"",
            self.project,
            escape_jql_string(&self.open_status),
            escape_jql_string(label)
        )
    }

    /// Converts a raw issue, tagging it with `campus`.
    fn to_issue(&self, raw: ApiIssue, campus: Option<&str>) -> Result<Issue, JiraffeError> {
        let created_at = DateTime::parse_from_str(&raw.fields.created, CREATED_FORMAT)
            .map_err(|e| JiraffeError::Tracker {
                message: format!(
                    "issue {} has unparseable created timestamp `{}`: {e}",
                    raw.key, raw.fields.created
                ),
                status: None,
                source: Some(Box::new(e)),
            })?
            .with_timezone(&self.offset);

        let fields = raw.fields;
        let campus = campus
            .map(str::to_string)
            .or_else(|| fields.labels.first().cloned())
            .unwrap_or_default();

        Ok(Issue {
            link: self.client.browse_link(&raw.key),
            key: raw.key,
            priority: fields.priority.map(|p| p.name).unwrap_or_default(),
            summary: fields.summary.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            campus,
            labels: fields.labels,
            reporter: fields.reporter.map(|u| u.name).unwrap_or_default(),
            assignee: fields.assignee.map(|u| u.name).unwrap_or_default(),
            created_at,
            chat_message_id: None,
        })
    }
}

/// Escapes `"` and `\` for use inside a quoted JQL string.
fn escape_jql_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl PluginAdapter for JiraTracker {
    fn name(&self) -> &str {
        "jira"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Tracker
    }

    async fn health_check(&self) -> Result<HealthStatus, JiraffeError> {
        match self.client.myself().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), JiraffeError> {
        Ok(())
    }
}

#[async_trait]
impl TrackerAdapter for JiraTracker {
    async fn search_open_issues(&self, label: &str) -> Result<Vec<Issue>, JiraffeError> {
        let jql = self.open_issues_jql(label);
        let raw = self.client.search(&jql, self.page_size).await?;
        debug!(label, count = raw.len(), "open issues fetched");

        // One malformed issue must not hide the rest of the campus.
        let mut issues = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for issue in raw {
            match self.to_issue(issue, Some(label)) {
                Ok(issue) => issues.push(issue),
                Err(e) => {
                    skipped += 1;
                    warn!(label, error = %e, "skipping issue that cannot be converted");
                }
            }
        }
        if skipped > 0 {
            warn!(label, skipped, kept = issues.len(), "search returned unusable issues");
        }
        Ok(issues)
    }

    async fn get_issue(&self, key: &str) -> Result<Issue, JiraffeError> {
        let raw = self.client.issue(key).await?;
        self.to_issue(raw, None)
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, JiraffeError> {
        let transitions = self.client.transitions(key).await?;
        Ok(transitions
            .into_iter()
            .map(|t| Transition {
                id: t.id,
                name: t.name,
            })
            .collect())
    }

    async fn apply_transition(
        &self,
        key: &str,
        transition_id: &str,
        priority: &str,
        assignee: &str,
    ) -> Result<(), JiraffeError> {
        let request = TransitionRequest {
            transition: TransitionRef {
                id: transition_id.to_string(),
            },
            fields: TransitionFields {
                priority: Named::new(priority),
                assignee: Named::new(assignee),
            },
        };
        self.client.do_transition(key, &request).await?;
        info!(key, transition_id, priority, assignee, "issue transitioned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tracker(base_url: &str) -> JiraTracker {
        let config = JiraConfig {
            base_url: Some(base_url.to_string()),
            api_token: Some("pat".to_string()),
            ..JiraConfig::default()
        };
        JiraTracker::new(&config).unwrap()
    }

    fn full_issue_json() -> serde_json::Value {
        serde_json::json!({
            "key": "SUP-42",
            "fields": {
                "summary": "Projector in room 3 is dead",
                "description": "No signal on HDMI",
                "priority": {"name": "High"},
                "reporter": {"name": "reporter"},
                "assignee": null,
                "labels": ["north-campus", "hardware"],
                "created": "2026-03-01T07:30:00.000+0000"
            }
        })
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = JiraTracker::new(&JiraConfig::default()).err().unwrap();
        assert!(err.to_string().contains("jira.base_url"), "got: {err}");

        let config = JiraConfig {
            base_url: Some("https://jira.example.com".into()),
            ..JiraConfig::default()
        };
        let err = JiraTracker::new(&config).err().unwrap();
        assert!(err.to_string().contains("jira.api_token"), "got: {err}");
    }

    #[test]
    fn jql_quotes_status_and_label() {
        let tracker = tracker("https://jira.example.com");
        assert_eq!(
            tracker.open_issues_jql("north-campus"),
            "project = SUP AND Status = \"Open\" AND Labels = \"north-campus\""
        );
        assert_eq!(
            tracker.open_issues_jql("odd\"label"),
            "project = SUP AND Status = \"Open\" AND Labels = \"odd\\\"label\""
        );
    }

    #[tokio::test]
    async fn search_maps_issues_and_tags_campus() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param(
                "jql",
                "project = SUP AND Status = \"Open\" AND Labels = \"north-campus\"",
            ))
            .and(query_param("maxResults", "20"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"issues": [full_issue_json()]})),
            )
            .mount(&server)
            .await;

        let tracker = tracker(&server.uri());
        let issues = tracker.search_open_issues("north-campus").await.unwrap();
        assert_eq!(issues.len(), 1);

        let issue = &issues[0];
        assert_eq!(issue.key, "SUP-42");
        assert_eq!(issue.link, format!("{}/browse/SUP-42", server.uri()));
        assert_eq!(issue.priority, "High");
        assert_eq!(issue.campus, "north-campus");
        assert_eq!(issue.reporter, "reporter");
        assert_eq!(issue.assignee, "");
        assert_eq!(issue.labels, ["north-campus", "hardware"]);
        // 07:30 UTC shown at the default +03:00 offset.
        assert_eq!(issue.created_at.to_rfc3339(), "2026-03-01T10:30:00+03:00");
    }

    #[tokio::test]
    async fn get_issue_takes_campus_from_first_label() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SUP-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_issue_json()))
            .mount(&server)
            .await;

        let issue = tracker(&server.uri()).get_issue("SUP-42").await.unwrap();
        assert_eq!(issue.campus, "north-campus");
        assert_eq!(issue.summary, "Projector in room 3 is dead");
    }

    #[tokio::test]
    async fn bad_created_timestamp_is_reported() {
        let server = MockServer::start().await;

        let mut body = full_issue_json();
        body["fields"]["created"] = serde_json::json!("yesterday");
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SUP-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = tracker(&server.uri()).get_issue("SUP-42").await.unwrap_err();
        assert!(err.to_string().contains("created timestamp"), "got: {err}");
    }

    #[tokio::test]
    async fn search_skips_issue_with_bad_timestamp() {
        let server = MockServer::start().await;

        let mut bad = full_issue_json();
        bad["key"] = serde_json::json!("SUP-2");
        bad["fields"]["created"] = serde_json::json!("2026-03-01 07:30");
        let mut good = full_issue_json();
        good["key"] = serde_json::json!("SUP-1");
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"issues": [good, bad]})),
            )
            .mount(&server)
            .await;

        let issues = tracker(&server.uri())
            .search_open_issues("north-campus")
            .await
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "SUP-1");
    }

    #[tokio::test]
    async fn transitions_are_listed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/SUP-42/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transitions": [
                    {"id": "11", "name": "Start progress"},
                    {"id": "21", "name": "Resolve"}
                ]
            })))
            .mount(&server)
            .await;

        let transitions = tracker(&server.uri())
            .list_transitions("SUP-42")
            .await
            .unwrap();
        assert_eq!(
            transitions,
            vec![
                Transition {
                    id: "11".into(),
                    name: "Start progress".into()
                },
                Transition {
                    id: "21".into(),
                    name: "Resolve".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_tracker() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/myself"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let status = tracker(&server.uri()).health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
