// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captured outbound messages, edits and acknowledgements for assertion
//! in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use jiraffe_core::traits::adapter::PluginAdapter;
use jiraffe_core::traits::channel::ChannelAdapter;
use jiraffe_core::types::{
    AdapterType, ChatEvent, ChatId, CommandEvent, ControlActivation, ControlSet, HealthStatus,
    MessageBody, MessageRef, OutboundMessage, Sender, TopicId, UserId,
};
use jiraffe_core::JiraffeError;

/// The chat every `MockChannel` pretends to be bound to.
pub const MOCK_CHAT_ID: ChatId = ChatId(-100_123);

/// First topic id handed out by [`MockChannel::create_topic`].
const FIRST_TOPIC_ID: i32 = 1000;

/// Current state of a message posted through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub topic: Option<TopicId>,
    pub body: MessageBody,
    pub controls: Option<ControlSet>,
}

impl PostedMessage {
    /// Tokens of the attached controls, row by row.
    pub fn tokens(&self) -> Vec<String> {
        self.controls
            .iter()
            .flat_map(|set| set.controls().map(|c| c.token.clone()))
            .collect()
    }
}

/// A sender with a predictable name derived from `id`.
pub fn sender(id: u64) -> Sender {
    Sender {
        id: UserId(id),
        username: Some(format!("user{id}")),
        display_name: format!("User {id}"),
    }
}

/// A control activation as the channel adapter would deliver it.
pub fn control_activation(
    sender_id: u64,
    message: Option<MessageRef>,
    topic: Option<TopicId>,
    token: &str,
) -> ControlActivation {
    ControlActivation {
        id: format!("cbq-{sender_id}-{token}"),
        sender: sender(sender_id),
        message,
        topic,
        token: Some(token.to_string()),
    }
}

/// A slash command as the channel adapter would deliver it.
pub fn command_event(
    sender_id: u64,
    topic: Option<TopicId>,
    command: &str,
    args: &[&str],
) -> CommandEvent {
    CommandEvent {
        chat_id: MOCK_CHAT_ID,
        topic,
        message_id: 1,
        sender: sender(sender_id),
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

/// A mock group chat for testing.
///
/// - **inbound**: events injected via `inject_event()` are returned by `receive()`;
///   after `close()` an empty queue makes `receive()` fail
/// - **messages**: everything posted via `send()`, kept current through edits
/// - **acknowledgements**: texts passed to `acknowledge()`
pub struct MockChannel {
    inbound: Mutex<VecDeque<ChatEvent>>,
    notify: Notify,
    closed: AtomicBool,
    sent: Mutex<Vec<OutboundMessage>>,
    messages: Mutex<HashMap<i32, PostedMessage>>,
    next_message_id: AtomicI32,
    acknowledgements: Mutex<Vec<String>>,
    admins: Mutex<Vec<UserId>>,
    admin_lookups: AtomicUsize,
    topics: Mutex<Vec<(String, TopicId)>>,
    fail_sends: AtomicBool,
    keep_controls_on_same_text: AtomicBool,
}

impl MockChannel {
    /// Create a new mock channel with no administrators and empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            messages: Mutex::new(HashMap::new()),
            next_message_id: AtomicI32::new(1),
            acknowledgements: Mutex::new(Vec::new()),
            admins: Mutex::new(Vec::new()),
            admin_lookups: AtomicUsize::new(0),
            topics: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            keep_controls_on_same_text: AtomicBool::new(false),
        }
    }

    /// Replace the group's administrators.
    pub async fn set_admins(&self, admins: Vec<UserId>) {
        *self.admins.lock().await = admins;
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject_event(&self, event: ChatEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Stop delivering events once the queue is empty.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Make `send()` fail until switched back.
    pub async fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make `edit_text()` with an unchanged body a no-op that keeps the
    /// controls, as Telegram does when it answers "message is not modified".
    pub async fn keep_controls_on_same_text(&self, keep: bool) {
        self.keep_controls_on_same_text.store(keep, Ordering::SeqCst);
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Current state of a posted message.
    pub async fn message(&self, message_id: i32) -> Option<PostedMessage> {
        self.messages.lock().await.get(&message_id).cloned()
    }

    /// Texts of all acknowledgements, in order.
    pub async fn acknowledgements(&self) -> Vec<String> {
        self.acknowledgements.lock().await.clone()
    }

    /// Topics created through `create_topic()`, in order.
    pub async fn created_topics(&self) -> Vec<(String, TopicId)> {
        self.topics.lock().await.clone()
    }

    /// Number of administrator lookups performed.
    pub async fn admin_lookups(&self) -> usize {
        self.admin_lookups.load(Ordering::SeqCst)
    }

    fn unknown_message(message: &MessageRef) -> JiraffeError {
        JiraffeError::Channel {
            message: format!("message {} not found", message.message_id),
            source: None,
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, JiraffeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), JiraffeError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), JiraffeError> {
        Ok(())
    }

    async fn receive(&self) -> Result<ChatEvent, JiraffeError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(JiraffeError::Channel {
                        message: "mock channel closed".to_string(),
                        source: None,
                    });
                }
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, JiraffeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(JiraffeError::Channel {
                message: "send failed".to_string(),
                source: None,
            });
        }

        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().await.insert(
            message_id,
            PostedMessage {
                topic: msg.topic,
                body: msg.body.clone(),
                controls: msg.controls.clone(),
            },
        );
        self.sent.lock().await.push(msg);
        Ok(MessageRef {
            chat_id: MOCK_CHAT_ID,
            message_id,
        })
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        body: &MessageBody,
    ) -> Result<(), JiraffeError> {
        let mut messages = self.messages.lock().await;
        let posted = messages
            .get_mut(&message.message_id)
            .ok_or_else(|| Self::unknown_message(message))?;
        if self.keep_controls_on_same_text.load(Ordering::SeqCst) && posted.body == *body {
            return Ok(());
        }
        posted.body = body.clone();
        posted.controls = None;
        Ok(())
    }

    async fn edit_controls(
        &self,
        message: &MessageRef,
        controls: &ControlSet,
    ) -> Result<(), JiraffeError> {
        let mut messages = self.messages.lock().await;
        let posted = messages
            .get_mut(&message.message_id)
            .ok_or_else(|| Self::unknown_message(message))?;
        posted.controls = (!controls.is_empty()).then(|| controls.clone());
        Ok(())
    }

    async fn acknowledge(&self, _activation_id: &str, text: &str) -> Result<(), JiraffeError> {
        self.acknowledgements.lock().await.push(text.to_string());
        Ok(())
    }

    async fn list_administrators(&self) -> Result<Vec<UserId>, JiraffeError> {
        self.admin_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.admins.lock().await.clone())
    }

    async fn create_topic(&self, name: &str) -> Result<TopicId, JiraffeError> {
        let mut topics = self.topics.lock().await;
        let topic = TopicId(FIRST_TOPIC_ID + topics.len() as i32);
        topics.push((name.to_string(), topic));
        Ok(topic)
    }
}
