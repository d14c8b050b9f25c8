// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the jiraffe core.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a forum topic (message thread) inside the group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId(pub i32);

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Identifier of a chat user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Tracker,
    Storage,
}

// --- Tracker domain ---

/// One tracker issue mirrored into chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker key, e.g. `SUP-42`. Unique and stable.
    pub key: String,
    /// Browser link to the issue.
    pub link: String,
    /// Priority label. Replaced during triage.
    pub priority: String,
    pub summary: String,
    pub description: String,
    /// Campus label the issue was found under.
    pub campus: String,
    /// All tracker labels attached to the issue.
    pub labels: Vec<String>,
    pub reporter: String,
    /// Assignee name. Replaced during triage.
    pub assignee: String,
    /// Creation time, localized to the configured offset.
    pub created_at: DateTime<FixedOffset>,
    /// Chat message the issue was posted as, once posted.
    pub chat_message_id: Option<i32>,
}

/// A tracker label bound one-to-one to a chat topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campus {
    pub name: String,
    pub topic_id: TopicId,
}

/// A registrant that can be picked as an assignee within one campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub campus_topic_id: TopicId,
}

/// A workflow transition available on a tracker issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written by this call.
    Inserted,
    /// A row with the same unique key was already present; nothing was written.
    AlreadyExisted,
}

// --- Chat domain ---

/// A styled run of text inside a [`MessageBody`].
///
/// Channel adapters decide how each style is rendered and escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Bold(String),
    Code(String),
    Link { label: String, url: String },
}

/// Platform-neutral message text made of styled segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBody {
    pub segments: Vec<Segment>,
}

impl MessageBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for an unstyled message.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().text(text)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    pub fn bold(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Bold(text.into()));
        self
    }

    pub fn code(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Code(text.into()));
        self
    }

    pub fn link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.segments.push(Segment::Link {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    /// Renders the body without any styling. Links render as `label (url)`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(s) | Segment::Bold(s) | Segment::Code(s) => out.push_str(s),
                Segment::Link { label, url } => {
                    out.push_str(label);
                    out.push_str(" (");
                    out.push_str(url);
                    out.push(')');
                }
            }
        }
        out
    }
}

/// One interactive button: a visible label plus the token delivered on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub token: String,
}

impl Control {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Rows of interactive controls attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSet {
    pub rows: Vec<Vec<Control>>,
}

impl ControlSet {
    /// All controls on a single row.
    pub fn row(controls: Vec<Control>) -> Self {
        if controls.is_empty() {
            return Self::default();
        }
        Self {
            rows: vec![controls],
        }
    }

    /// One control per row.
    pub fn column(controls: Vec<Control>) -> Self {
        Self {
            rows: controls.into_iter().map(|c| vec![c]).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }

    /// Iterates over every control, row by row.
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.rows.iter().flatten()
    }
}

/// A message to post into the group chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Target forum topic. `None` posts to the general topic.
    pub topic: Option<TopicId>,
    pub body: MessageBody,
    pub controls: Option<ControlSet>,
}

impl OutboundMessage {
    /// A message without controls.
    pub fn text(topic: Option<TopicId>, body: MessageBody) -> Self {
        Self {
            topic,
            body,
            controls: None,
        }
    }
}

/// Address of a message that was posted and may be edited later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i32,
}

/// The user behind an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub display_name: String,
}

/// A slash command typed into the group chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub chat_id: ChatId,
    pub topic: Option<TopicId>,
    pub message_id: i32,
    pub sender: Sender,
    /// Command name without the leading slash or `@bot` suffix, lowercased.
    pub command: String,
    pub args: Vec<String>,
}

/// An activation of an interactive control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlActivation {
    /// Platform id used to acknowledge the activation.
    pub id: String,
    pub sender: Sender,
    /// The message carrying the control, if still accessible.
    pub message: Option<MessageRef>,
    /// Forum topic of that message.
    pub topic: Option<TopicId>,
    /// The opaque token attached to the control.
    pub token: Option<String>,
}

/// An inbound event delivered by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Command(CommandEvent),
    Control(ControlActivation),
}

impl ChatEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            ChatEvent::Command(c) => &c.sender,
            ChatEvent::Control(c) => &c.sender,
        }
    }
}
