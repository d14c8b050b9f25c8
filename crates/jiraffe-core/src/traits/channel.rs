// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the group chat (Telegram).

use async_trait::async_trait;

use crate::error::JiraffeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChatEvent, ControlSet, MessageBody, MessageRef, OutboundMessage, TopicId, UserId,
};

/// Adapter for the group chat the issues are relayed into.
///
/// An adapter is bound to exactly one group chat; topics are addressed by
/// [`TopicId`] within it.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Starts receiving updates from the platform.
    async fn connect(&mut self) -> Result<(), JiraffeError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<ChatEvent, JiraffeError>;

    /// Posts a message, optionally with controls.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, JiraffeError>;

    /// Replaces the text of a message. Any controls on it are removed, except
    /// when the new text equals the current one and the chat keeps the message.
    async fn edit_text(
        &self,
        message: &MessageRef,
        body: &MessageBody,
    ) -> Result<(), JiraffeError>;

    /// Replaces the controls of a message, leaving its text untouched.
    async fn edit_controls(
        &self,
        message: &MessageRef,
        controls: &ControlSet,
    ) -> Result<(), JiraffeError>;

    /// Answers a control activation with text shown only to the activating user.
    async fn acknowledge(&self, activation_id: &str, text: &str) -> Result<(), JiraffeError>;

    /// Fetches the current administrators of the group chat.
    async fn list_administrators(&self) -> Result<Vec<UserId>, JiraffeError>;

    /// Creates a forum topic and returns its id.
    async fn create_topic(&self, name: &str) -> Result<TopicId, JiraffeError>;
}
