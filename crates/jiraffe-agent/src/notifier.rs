// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Posts newly discovered issues into their campus topic.

use std::sync::Arc;

use jiraffe_core::types::{Control, ControlSet, Issue, MessageRef, OutboundMessage, TopicId};
use jiraffe_core::{ChannelAdapter, JiraffeError};
use tracing::debug;

use crate::render::render_issue;
use crate::token::TriageToken;

/// Formats issues and posts them with a single "Begin" control.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    begin_label: String,
}

impl Notifier {
    pub fn new(channel: Arc<dyn ChannelAdapter + Send + Sync>, begin_label: String) -> Self {
        Self {
            channel,
            begin_label,
        }
    }

    /// Posts `issue` into `topic` and returns the posted message.
    pub async fn notify(&self, issue: &Issue, topic: TopicId) -> Result<MessageRef, JiraffeError> {
        let token = TriageToken::Begin {
            key: issue.key.clone(),
        }
        .encode()?;

        let message = OutboundMessage {
            topic: Some(topic),
            body: render_issue(issue),
            controls: Some(ControlSet::row(vec![Control::new(
                self.begin_label.clone(),
                token,
            )])),
        };
        let posted = self.channel.send(message).await?;
        debug!(key = %issue.key, %topic, message_id = posted.message_id, "issue posted");
        Ok(posted)
    }
}
