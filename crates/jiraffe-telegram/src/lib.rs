// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for jiraffe.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling bound to one forum supergroup, forum topics, inline
//! keyboards and MarkdownV2 formatting with a plain-text fallback.

pub mod handler;
pub mod markdown;

use std::time::Duration;

use async_trait::async_trait;
use jiraffe_config::model::TelegramConfig;
use jiraffe_core::error::JiraffeError;
use jiraffe_core::traits::{ChannelAdapter, PluginAdapter};
use jiraffe_core::types::{
    AdapterType, ChatEvent, ControlSet, HealthStatus, MessageBody, MessageRef, OutboundMessage,
    TopicId, UserId,
};
use teloxide::dispatching::{Dispatcher, ShutdownToken, UpdateFilterExt};
use teloxide::dptree;
use teloxide::payloads::setters::*;
use teloxide::prelude::{respond, Requester};
use teloxide::types::{
    CallbackQuery, CallbackQueryId, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    MessageId, ParseMode, ThreadId, Update,
};
use teloxide::{ApiError, Bot, RequestError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Bound to the supergroup in `telegram.chat_id`; updates from any other
/// chat are dropped.
pub struct TelegramChannel {
    bot: Bot,
    chat_id: ChatId,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<ChatEvent>>,
    inbound_tx: mpsc::Sender<ChatEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_token: Option<ShutdownToken>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` and `config.chat_id` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, JiraffeError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            JiraffeError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(JiraffeError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let chat_id = config.chat_id.map(ChatId).ok_or_else(|| {
            JiraffeError::Config("telegram.chat_id is required for Telegram adapter".into())
        })?;

        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| JiraffeError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let bot = Bot::with_client(token, client);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            chat_id,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
            shutdown_token: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    fn message_id(message: &MessageRef) -> MessageId {
        MessageId(message.message_id)
    }
}

/// Builds the inline keyboard for a control set.
fn keyboard(controls: &ControlSet) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(controls.rows.iter().map(|row| {
        row.iter()
            .map(|c| InlineKeyboardButton::callback(c.label.clone(), c.token.clone()))
            .collect::<Vec<_>>()
    }))
}

fn channel_error(context: &str, e: RequestError) -> JiraffeError {
    JiraffeError::Channel {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn is_parse_error(e: &RequestError) -> bool {
    matches!(e, RequestError::Api(ApiError::CantParseEntities(_)))
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, JiraffeError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), JiraffeError> {
        debug!("Telegram channel shutting down");
        if let Some(token) = &self.shutdown_token
            && let Ok(done) = token.shutdown()
        {
            done.await;
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), JiraffeError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        if self.config.drop_pending_updates {
            self.bot
                .delete_webhook()
                .drop_pending_updates(true)
                .await
                .map_err(|e| channel_error("failed to drop pending updates", e))?;
        }

        let target = jiraffe_core::ChatId(self.chat_id.0);
        let message_tx = self.inbound_tx.clone();
        let query_tx = self.inbound_tx.clone();

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(move |msg: Message| {
                let tx = message_tx.clone();
                async move {
                    if !handler::is_target_chat(&msg.chat, target) {
                        debug!(chat_id = msg.chat.id.0, "ignoring message from other chat");
                        return respond(());
                    }
                    if let Some(event) = handler::to_command_event(&msg)
                        && tx.send(event).await.is_err()
                    {
                        warn!("inbound channel closed, dropping command");
                    }
                    respond(())
                }
            }))
            .branch(
                Update::filter_callback_query().endpoint(move |query: CallbackQuery| {
                    let tx = query_tx.clone();
                    async move {
                        if handler::is_foreign_query(&query, target) {
                            debug!("ignoring callback query from other chat");
                            return respond(());
                        }
                        if tx.send(handler::to_control_event(&query)).await.is_err() {
                            warn!("inbound channel closed, dropping control activation");
                        }
                        respond(())
                    }
                }),
            );

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_| async {}) // Silently ignore other update kinds
            .build();
        self.shutdown_token = Some(dispatcher.shutdown_token());

        info!(chat_id = self.chat_id.0, "starting Telegram long polling");
        let handle = tokio::spawn(async move {
            dispatcher.dispatch().await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<ChatEvent, JiraffeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| JiraffeError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, JiraffeError> {
        let thread = msg.topic.map(|TopicId(id)| ThreadId(MessageId(id)));
        let markup = msg
            .controls
            .as_ref()
            .filter(|c| !c.is_empty())
            .map(keyboard);

        let mut request = self
            .bot
            .send_message(self.chat_id, markdown::render_body(&msg.body))
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(thread) = thread {
            request = request.message_thread_id(thread);
        }
        if let Some(markup) = markup.clone() {
            request = request.reply_markup(markup);
        }

        let sent = match request.await {
            Ok(sent) => sent,
            Err(e) if is_parse_error(&e) => {
                warn!(error = %e, "MarkdownV2 failed, sending as plain text");
                let mut plain = self.bot.send_message(self.chat_id, msg.body.plain_text());
                if let Some(thread) = thread {
                    plain = plain.message_thread_id(thread);
                }
                if let Some(markup) = markup {
                    plain = plain.reply_markup(markup);
                }
                plain
                    .await
                    .map_err(|e| channel_error("failed to send message", e))?
            }
            Err(e) => return Err(channel_error("failed to send message", e)),
        };

        Ok(MessageRef {
            chat_id: jiraffe_core::ChatId(sent.chat.id.0),
            message_id: sent.id.0,
        })
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        body: &MessageBody,
    ) -> Result<(), JiraffeError> {
        let chat_id = ChatId(message.chat_id.0);
        let msg_id = Self::message_id(message);

        let result = self
            .bot
            .edit_message_text(chat_id, msg_id, markdown::render_body(body))
            .parse_mode(ParseMode::MarkdownV2)
            .await;

        match result {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) if is_parse_error(&e) => {
                warn!(error = %e, "MarkdownV2 edit failed, retrying as plain text");
                match self
                    .bot
                    .edit_message_text(chat_id, msg_id, body.plain_text())
                    .await
                {
                    Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
                    Err(e) => Err(channel_error("failed to edit message", e)),
                }
            }
            Err(e) => Err(channel_error("failed to edit message", e)),
        }
    }

    async fn edit_controls(
        &self,
        message: &MessageRef,
        controls: &ControlSet,
    ) -> Result<(), JiraffeError> {
        let result = self
            .bot
            .edit_message_reply_markup(ChatId(message.chat_id.0), Self::message_id(message))
            .reply_markup(keyboard(controls))
            .await;

        match result {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(channel_error("failed to edit controls", e)),
        }
    }

    async fn acknowledge(&self, activation_id: &str, text: &str) -> Result<(), JiraffeError> {
        self.bot
            .answer_callback_query(CallbackQueryId(activation_id.to_string()))
            .text(text)
            .await
            .map_err(|e| channel_error("failed to answer callback query", e))?;
        Ok(())
    }

    async fn list_administrators(&self) -> Result<Vec<UserId>, JiraffeError> {
        let members = self
            .bot
            .get_chat_administrators(self.chat_id)
            .await
            .map_err(|e| channel_error("failed to fetch chat administrators", e))?;
        Ok(members
            .iter()
            .filter(|m| m.is_privileged())
            .map(|m| UserId(m.user.id.0))
            .collect())
    }

    async fn create_topic(&self, name: &str) -> Result<TopicId, JiraffeError> {
        let topic = self
            .bot
            .create_forum_topic(self.chat_id, name)
            .await
            .map_err(|e| channel_error("failed to create forum topic", e))?;
        info!(name, thread_id = topic.thread_id.0.0, "forum topic created");
        Ok(TopicId(topic.thread_id.0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiraffe_core::types::Control;

    fn config(token: Option<&str>, chat_id: Option<i64>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            chat_id,
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(config(None, Some(-100))).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(config(Some(""), Some(-100))).is_err());
    }

    #[test]
    fn new_requires_chat_id() {
        let err = TelegramChannel::new(config(Some("test:token"), None))
            .err()
            .unwrap();
        assert!(err.to_string().contains("chat_id"), "got: {err}");
    }

    #[test]
    fn new_accepts_valid_config() {
        let channel = TelegramChannel::new(config(
            Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"),
            Some(-1001234567890),
        ))
        .unwrap();
        assert_eq!(channel.chat_id, ChatId(-1001234567890));
    }

    #[test]
    fn keyboard_keeps_row_layout() {
        let controls = ControlSet {
            rows: vec![
                vec![
                    Control::new("Low", "SUP-1_low_priority"),
                    Control::new("High", "SUP-1_high_priority"),
                ],
                vec![Control::new("alice", "SUP-1_high_alice_assign")],
            ],
        };
        let markup = keyboard(&controls);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[0][1].text, "High");
        assert_eq!(markup.inline_keyboard[1][0].text, "alice");
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(config(Some("test:token"), Some(-100))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }
}
