// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion into channel-agnostic [`ChatEvent`]s.
//!
//! Only updates from the configured group chat are accepted. Text messages
//! starting with `/` become [`CommandEvent`]s and callback queries become
//! [`ControlActivation`]s; everything else is dropped.

use jiraffe_core::types::{
    ChatEvent, ChatId, CommandEvent, ControlActivation, MessageRef, Sender, TopicId, UserId,
};
use teloxide::types::{CallbackQuery, Chat, Message, User};

/// Checks whether a chat is the one the adapter is bound to.
pub fn is_target_chat(chat: &Chat, target: ChatId) -> bool {
    chat.id.0 == target.0
}

/// Splits `/cmd@bot arg1 arg2` into a lowercased command name and its arguments.
///
/// Returns `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some((
        name.to_lowercase(),
        parts.map(str::to_string).collect(),
    ))
}

/// Forum topic a message was posted in. Messages in the General topic have none.
pub fn message_topic(msg: &Message) -> Option<TopicId> {
    if !msg.is_topic_message {
        return None;
    }
    msg.thread_id.map(|thread| TopicId(thread.0.0))
}

/// Maps a Telegram user onto a [`Sender`].
pub fn to_sender(user: &User) -> Sender {
    Sender {
        id: UserId(user.id.0),
        username: user.username.clone(),
        display_name: user.full_name(),
    }
}

/// Converts a command message into a [`ChatEvent::Command`].
pub fn to_command_event(msg: &Message) -> Option<ChatEvent> {
    let user = msg.from.as_ref()?;
    let (command, args) = parse_command(msg.text()?)?;
    Some(ChatEvent::Command(CommandEvent {
        chat_id: ChatId(msg.chat.id.0),
        topic: message_topic(msg),
        message_id: msg.id.0,
        sender: to_sender(user),
        command,
        args,
    }))
}

/// Converts a callback query into a [`ChatEvent::Control`].
pub fn to_control_event(query: &CallbackQuery) -> ChatEvent {
    let message = query.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat().id.0),
        message_id: m.id().0,
    });
    let topic = query
        .message
        .as_ref()
        .and_then(|m| m.regular_message())
        .and_then(message_topic);

    ChatEvent::Control(ControlActivation {
        id: query.id.0.clone(),
        sender: to_sender(&query.from),
        message,
        topic,
        token: query.data.clone(),
    })
}

/// Returns `true` when the query's message belongs to another chat.
///
/// Queries whose message is unknown are let through; the triage flow
/// answers those itself.
pub fn is_foreign_query(query: &CallbackQuery, target: ChatId) -> bool {
    query
        .message
        .as_ref()
        .is_some_and(|m| !is_target_chat(m.chat(), target))
}
