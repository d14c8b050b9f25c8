// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator slash commands: campus creation and user registration.

use std::sync::Arc;

use jiraffe_core::types::{
    Campus, CommandEvent, InsertOutcome, MessageBody, OutboundMessage, User,
};
use jiraffe_core::{ChannelAdapter, JiraffeError, StorageAdapter};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::auth::{NOT_ADMIN_TEXT, is_admin};

const MAX_NAME_LEN: usize = 64;

const HELP_TEXT: &str = "/create <name> - create a campus and its topic\n\
/register <name> - register a user in this campus\n\
/unregister <name> - remove a user from this campus\n\
/help - show this message";

const NOT_CAMPUS_TOPIC_TEXT: &str = "You can register only inside campus topics";

/// Handles slash commands typed into the group.
pub struct CommandHandler {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    refresh: Arc<Notify>,
}

impl CommandHandler {
    /// `refresh` is signalled after a campus is created.
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        refresh: Arc<Notify>,
    ) -> Self {
        Self {
            storage,
            channel,
            refresh,
        }
    }

    /// Runs a command and posts the reply into the command's topic.
    ///
    /// Returns the reply, or `None` for commands this bot does not know.
    pub async fn handle(&self, cmd: &CommandEvent) -> Result<Option<String>, JiraffeError> {
        let reply = match cmd.command.as_str() {
            "help" => HELP_TEXT.to_string(),
            "create" | "register" | "unregister" => {
                if is_admin(self.channel.as_ref(), cmd.sender.id).await? {
                    self.run_admin_command(cmd).await?
                } else {
                    info!(user = cmd.sender.id.0, command = %cmd.command, "command used by non-admin");
                    NOT_ADMIN_TEXT.to_string()
                }
            }
            other => {
                debug!(command = other, "ignoring unknown command");
                return Ok(None);
            }
        };

        self.channel
            .send(OutboundMessage::text(cmd.topic, MessageBody::plain(reply.clone())))
            .await?;
        Ok(Some(reply))
    }

    async fn run_admin_command(&self, cmd: &CommandEvent) -> Result<String, JiraffeError> {
        let [arg] = cmd.args.as_slice() else {
            return Ok(format!(
                "Invalid number of arguments. Expected: /{} <name>",
                cmd.command
            ));
        };

        match cmd.command.as_str() {
            "create" => match validate_name(arg, false) {
                Ok(name) => self.create_campus(name).await,
                Err(reply) => Ok(reply),
            },
            "register" | "unregister" => {
                let name = match validate_name(arg, true) {
                    Ok(name) => name,
                    Err(reply) => return Ok(reply),
                };
                let Some(campus) = self.campus_of(cmd).await? else {
                    return Ok(NOT_CAMPUS_TOPIC_TEXT.to_string());
                };
                if cmd.command == "register" {
                    self.register(name, &campus).await
                } else {
                    self.unregister(name, &campus).await
                }
            }
            other => Err(JiraffeError::Internal(format!(
                "no admin handler for /{other}"
            ))),
        }
    }

    async fn campus_of(&self, cmd: &CommandEvent) -> Result<Option<Campus>, JiraffeError> {
        match cmd.topic {
            Some(topic) => self.storage.campus_by_topic(topic).await,
            None => Ok(None),
        }
    }

    async fn create_campus(&self, name: &str) -> Result<String, JiraffeError> {
        match self.storage.campus_topic_id(name).await {
            Ok(_) => return Ok(format!("Campus {name} already exists")),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let topic_id = self.channel.create_topic(name).await?;
        let campus = Campus {
            name: name.to_string(),
            topic_id,
        };
        match self.storage.insert_campus(&campus).await {
            Ok(()) => {}
            Err(JiraffeError::AlreadyExists { .. }) => {
                warn!(campus = name, %topic_id, "campus created concurrently, new topic left unused");
                return Ok(format!("Campus {name} already exists"));
            }
            Err(e) => return Err(e),
        }

        self.refresh.notify_one();
        info!(campus = name, %topic_id, "campus created");
        Ok(format!("Campus {name} created"))
    }

    async fn register(&self, name: &str, campus: &Campus) -> Result<String, JiraffeError> {
        let user = User {
            name: name.to_string(),
            campus_topic_id: campus.topic_id,
        };
        match self.storage.insert_user(&user).await? {
            InsertOutcome::Inserted => {
                info!(user = name, campus = %campus.name, "user registered");
                Ok(format!("User {name} registered in {}", campus.name))
            }
            InsertOutcome::AlreadyExisted => Ok(format!("User {name} already registered")),
        }
    }

    async fn unregister(&self, name: &str, campus: &Campus) -> Result<String, JiraffeError> {
        if self.storage.delete_user(name, campus.topic_id).await? {
            info!(user = name, campus = %campus.name, "user unregistered");
            Ok(format!("User {name} unregistered"))
        } else {
            Ok(format!("User {name} is not registered here"))
        }
    }
}

/// Checks a campus label or user name, returning the reply text on failure.
///
/// User names may be written as `@handle`; the `@` is dropped.
fn validate_name(raw: &str, is_user: bool) -> Result<&str, String> {
    let name = if is_user {
        raw.strip_prefix('@').unwrap_or(raw)
    } else {
        raw
    };
    let kind = if is_user { "user name" } else { "campus name" };

    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(format!(
            "Invalid {kind}: must be 1 to {MAX_NAME_LEN} characters"
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(format!(
            "Invalid {kind}: use only letters, digits, '.', '_' and '-'"
        ));
    }
    Ok(name)
}
