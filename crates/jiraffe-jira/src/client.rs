// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Jira REST v2 API.
//!
//! Provides [`JiraClient`] which handles URL construction, bearer
//! authentication and status mapping. Requests are never retried.

use std::time::Duration;

use jiraffe_core::JiraffeError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, ApiIssue, ApiTransition, SearchResponse, TransitionRequest,
    TransitionsResponse,
};

/// HTTP client for one Jira instance.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl JiraClient {
    /// Creates a client for the instance at `base_url`, authenticating with a
    /// personal access token.
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, JiraffeError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| JiraffeError::Config(format!("invalid jira.base_url `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(JiraffeError::Config(format!(
                "jira.base_url `{base_url}` cannot be used as a base URL"
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|e| JiraffeError::Config(format!("invalid jira.api_token header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| JiraffeError::Tracker {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Browser link for an issue: `{base}/browse/{key}`.
    pub fn browse_link(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Runs a JQL search.
    pub async fn search(&self, jql: &str, max_results: u32) -> Result<Vec<ApiIssue>, JiraffeError> {
        let url = self.endpoint(&["search"]);
        debug!(%jql, max_results, "searching issues");
        let response = self
            .client
            .get(url)
            .query(&[("jql", jql.to_string()), ("maxResults", max_results.to_string())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: SearchResponse = self.read_json(response, None).await?;
        Ok(body.issues)
    }

    /// Fetches one issue.
    pub async fn issue(&self, key: &str) -> Result<ApiIssue, JiraffeError> {
        let url = self.endpoint(&["issue", key]);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.read_json(response, Some(key)).await
    }

    /// Lists the transitions available on an issue.
    pub async fn transitions(&self, key: &str) -> Result<Vec<ApiTransition>, JiraffeError> {
        let url = self.endpoint(&["issue", key, "transitions"]);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: TransitionsResponse = self.read_json(response, Some(key)).await?;
        Ok(body.transitions)
    }

    /// Executes a transition. Jira answers `204 No Content` on success.
    pub async fn do_transition(
        &self,
        key: &str,
        request: &TransitionRequest,
    ) -> Result<(), JiraffeError> {
        let url = self.endpoint(&["issue", key, "transitions"]);
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(status = %status, key, "transition response received");
        if status.is_success() {
            return Ok(());
        }
        Err(status_error(response, Some(key)).await)
    }

    /// Fetches the authenticated user; used as a health check.
    pub async fn myself(&self) -> Result<(), JiraffeError> {
        let url = self.endpoint(&["myself"]);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response, None).await)
        }
    }

    /// `{base}/rest/api/2/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["rest", "api", "2"]).extend(segments);
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        key: Option<&str>,
    ) -> Result<T, JiraffeError> {
        let status = response.status();
        debug!(status = %status, url = %response.url(), "jira response received");
        if !status.is_success() {
            return Err(status_error(response, key).await);
        }
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| JiraffeError::Tracker {
            message: format!("failed to parse Jira response: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> JiraffeError {
        if e.is_timeout() {
            return JiraffeError::Timeout {
                duration: self.timeout,
            };
        }
        JiraffeError::Tracker {
            message: format!("HTTP request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        }
    }
}

/// Maps a non-success response onto a [`JiraffeError`].
///
/// A 404 on an issue endpoint becomes [`JiraffeError::NotFound`].
async fn status_error(response: Response, key: Option<&str>) -> JiraffeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.summary())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or(body);

    match (status, key) {
        (StatusCode::NOT_FOUND, Some(key)) => JiraffeError::not_found("issue", key),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            JiraffeError::Unauthorized(format!("Jira returned {status}: {detail}"))
        }
        _ => JiraffeError::Tracker {
            message: format!("Jira returned {status}: {detail}"),
            status: Some(status.as_u16()),
            source: None,
        },
    }
}
