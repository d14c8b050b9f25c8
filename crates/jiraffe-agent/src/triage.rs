// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage workflow driven by control activations.
//!
//! A posted issue moves through three steps, all on the same chat message:
//!
//! 1. `begin`: offer one row of priorities.
//! 2. `priority`: re-render the card with the chosen priority and offer the
//!    users registered in the message's campus.
//! 3. `assign`: re-render with priority and assignee, run the start
//!    transition on the tracker, then remove the controls.
//!
//! The token on the activated control is the only state carried between
//! steps. The priority and assign steps re-fetch the issue and apply the
//! token's values on top of it. The priority step offers the users of the
//! card's topic, or of the issue's campus when the chat does not report one.

use std::sync::Arc;

use jiraffe_core::types::{Control, ControlActivation, ControlSet, Issue, MessageRef, TopicId};
use jiraffe_core::{ChannelAdapter, JiraffeError, StorageAdapter, TrackerAdapter};
use tracing::{debug, info, warn};

use crate::auth::{NOT_ADMIN_TEXT, is_admin};
use crate::recording;
use crate::render::render_issue;
use crate::token::{Priorities, TriageToken};

const FAILURE_TEXT: &str = "Something went wrong, please try again later";

/// How a control activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageOutcome {
    /// The activating user is not a group administrator. Nothing was changed.
    Unauthorized,
    /// The token could not be decoded or named an unknown priority.
    Malformed,
    /// The control's message is no longer accessible.
    MessageUnavailable,
    IssueNotFound { key: String },
    PriorityOffered,
    AssigneesOffered { count: usize },
    /// Priority was set but the campus has no registered users to offer.
    NoAssignees,
    Transitioned { key: String },
    /// The start transition is not available, usually because another
    /// administrator finished the triage first.
    AlreadyInProgress { key: String },
}

impl TriageOutcome {
    /// Text shown to the activating user.
    pub fn acknowledgement(&self) -> String {
        match self {
            TriageOutcome::Unauthorized => NOT_ADMIN_TEXT.to_string(),
            TriageOutcome::Malformed => "This control is no longer valid".to_string(),
            TriageOutcome::MessageUnavailable => {
                "The issue message is no longer available".to_string()
            }
            TriageOutcome::IssueNotFound { key } => format!("Issue {key} not found"),
            TriageOutcome::PriorityOffered => "Progress starting...".to_string(),
            TriageOutcome::AssigneesOffered { .. } => "Priority picked".to_string(),
            TriageOutcome::NoAssignees => {
                "Priority picked, but nobody is registered in this campus".to_string()
            }
            TriageOutcome::Transitioned { .. } => {
                "Issue transitioned to \"In Progress\" successfully".to_string()
            }
            TriageOutcome::AlreadyInProgress { key } => format!("issue {key} already in progress"),
        }
    }

    fn completion_label(&self) -> Option<&'static str> {
        match self {
            TriageOutcome::Transitioned { .. } => Some("transitioned"),
            TriageOutcome::AlreadyInProgress { .. } => Some("already_in_progress"),
            _ => None,
        }
    }
}

/// Advances triage sessions in response to control activations.
pub struct TriageController {
    tracker: Arc<dyn TrackerAdapter + Send + Sync>,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    priorities: Priorities,
    start_transition: String,
}

impl TriageController {
    pub fn new(
        tracker: Arc<dyn TrackerAdapter + Send + Sync>,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        priorities: Priorities,
        start_transition: String,
    ) -> Self {
        Self {
            tracker,
            storage,
            channel,
            priorities,
            start_transition,
        }
    }

    /// Handles one activation and acknowledges it to the activating user.
    ///
    /// A missing issue is a normal outcome. Any other failure is acknowledged
    /// with a generic text and returned.
    pub async fn handle(
        &self,
        activation: &ControlActivation,
    ) -> Result<TriageOutcome, JiraffeError> {
        let outcome = match self.advance(activation).await {
            Ok(outcome) => outcome,
            Err(JiraffeError::NotFound { kind: "issue", key }) => {
                TriageOutcome::IssueNotFound { key }
            }
            Err(e) => {
                if let Err(ack_err) = self.channel.acknowledge(&activation.id, FAILURE_TEXT).await {
                    warn!(error = %ack_err, "failed to acknowledge failed activation");
                }
                return Err(e);
            }
        };

        if let Some(label) = outcome.completion_label() {
            recording::record_triage_completed(label);
        }
        self.channel
            .acknowledge(&activation.id, &outcome.acknowledgement())
            .await?;
        Ok(outcome)
    }

    async fn advance(
        &self,
        activation: &ControlActivation,
    ) -> Result<TriageOutcome, JiraffeError> {
        if !is_admin(self.channel.as_ref(), activation.sender.id).await? {
            info!(user = activation.sender.id.0, "triage control used by non-admin");
            return Ok(TriageOutcome::Unauthorized);
        }

        let Some(raw) = activation.token.as_deref() else {
            return Ok(TriageOutcome::Malformed);
        };
        let token = match TriageToken::decode(raw) {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "ignoring malformed control token");
                return Ok(TriageOutcome::Malformed);
            }
        };
        let Some(message) = activation.message else {
            return Ok(TriageOutcome::MessageUnavailable);
        };

        match token {
            TriageToken::Begin { key } => self.begin(&key, &message).await,
            TriageToken::Priority { key, priority } => {
                let Some(label) = self.priorities.resolve(&priority) else {
                    debug!(key = %key, priority = %priority, "unknown priority in token");
                    return Ok(TriageOutcome::Malformed);
                };
                self.pick_priority(&key, label, &message, activation.topic)
                    .await
            }
            TriageToken::Assign {
                key,
                priority,
                assignee,
            } => {
                let Some(label) = self.priorities.resolve(&priority) else {
                    debug!(key = %key, priority = %priority, "unknown priority in token");
                    return Ok(TriageOutcome::Malformed);
                };
                self.assign(&key, label, &assignee, &message).await
            }
        }
    }

    async fn begin(&self, key: &str, message: &MessageRef) -> Result<TriageOutcome, JiraffeError> {
        self.tracker.get_issue(key).await?;
        self.channel
            .edit_controls(message, &self.priority_controls(key)?)
            .await?;
        debug!(key, "priorities offered");
        Ok(TriageOutcome::PriorityOffered)
    }

    async fn pick_priority(
        &self,
        key: &str,
        priority: &str,
        message: &MessageRef,
        topic: Option<TopicId>,
    ) -> Result<TriageOutcome, JiraffeError> {
        let mut issue = self.tracker.get_issue(key).await?;
        issue.priority = priority.to_string();
        self.channel.edit_text(message, &render_issue(&issue)).await?;

        let topic = match topic {
            Some(topic) => Some(topic),
            None => self.campus_topic_of(&issue).await?,
        };
        let users = match topic {
            Some(topic) => self.storage.list_users_in_campus(topic).await?,
            None => Vec::new(),
        };
        let token_priority = Priorities::token_value(priority);
        let controls: Vec<Control> = users
            .iter()
            .filter_map(|user| {
                let token = TriageToken::Assign {
                    key: key.to_string(),
                    priority: token_priority.clone(),
                    assignee: user.name.clone(),
                };
                match token.encode() {
                    Ok(encoded) => Some(Control::new(user.name.clone(), encoded)),
                    Err(e) => {
                        warn!(user = %user.name, error = %e, "cannot offer user as assignee");
                        None
                    }
                }
            })
            .collect();

        if controls.is_empty() {
            // Keep the priority row so the step can be retried once users exist.
            self.channel
                .edit_controls(message, &self.priority_controls(key)?)
                .await?;
            info!(key, ?topic, "no registered users to offer");
            return Ok(TriageOutcome::NoAssignees);
        }

        let count = controls.len();
        self.channel
            .edit_controls(message, &ControlSet::column(controls))
            .await?;
        debug!(key, priority, count, "assignees offered");
        Ok(TriageOutcome::AssigneesOffered { count })
    }

    async fn assign(
        &self,
        key: &str,
        priority: &str,
        assignee: &str,
        message: &MessageRef,
    ) -> Result<TriageOutcome, JiraffeError> {
        let mut issue = self.tracker.get_issue(key).await?;
        issue.priority = priority.to_string();
        issue.assignee = assignee.to_string();
        self.channel.edit_text(message, &render_issue(&issue)).await?;

        let transitions = self.tracker.list_transitions(key).await?;
        let outcome = match transitions
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&self.start_transition))
        {
            Some(start) => {
                self.tracker
                    .apply_transition(key, &start.id, priority, assignee)
                    .await?;
                info!(key, priority, assignee, "issue moved to in progress");
                TriageOutcome::Transitioned {
                    key: key.to_string(),
                }
            }
            None => {
                info!(key, "start transition unavailable, issue already in progress");
                TriageOutcome::AlreadyInProgress {
                    key: key.to_string(),
                }
            }
        };

        // An unchanged text edit leaves the keyboard in place.
        self.channel
            .edit_controls(message, &ControlSet::default())
            .await?;
        Ok(outcome)
    }

    /// Topic of the first campus among the issue's labels.
    ///
    /// Used when the activation did not say which topic the card is in.
    async fn campus_topic_of(&self, issue: &Issue) -> Result<Option<TopicId>, JiraffeError> {
        let labels = std::iter::once(&issue.campus).chain(issue.labels.iter());
        for label in labels.filter(|l| !l.is_empty()) {
            match self.storage.campus_topic_id(label).await {
                Ok(topic) => {
                    debug!(key = %issue.key, campus = %label, %topic, "topic taken from issue labels");
                    return Ok(Some(topic));
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn priority_controls(&self, key: &str) -> Result<ControlSet, JiraffeError> {
        let controls = self
            .priorities
            .labels()
            .iter()
            .map(|label| {
                let token = TriageToken::Priority {
                    key: key.to_string(),
                    priority: Priorities::token_value(label),
                };
                Ok(Control::new(label.clone(), token.encode()?))
            })
            .collect::<Result<Vec<_>, JiraffeError>>()?;
        Ok(ControlSet::row(controls))
    }
}
