// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded worker pool for inbound chat events.

use std::sync::Arc;
use std::time::Duration;

use jiraffe_config::model::DispatchConfig;
use jiraffe_core::types::ChatEvent;
use jiraffe_core::ChannelAdapter;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::CommandHandler;
use crate::shutdown;
use crate::triage::TriageController;

/// Pulls events from the channel and runs each in its own task.
///
/// At most `max_concurrent_events` events are handled at once; receiving
/// pauses while the pool is full.
pub struct EventDispatcher {
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    triage: Arc<TriageController>,
    commands: Arc<CommandHandler>,
    config: DispatchConfig,
}

impl EventDispatcher {
    pub fn new(
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        triage: Arc<TriageController>,
        commands: Arc<CommandHandler>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            channel,
            triage,
            commands,
            config,
        }
    }

    /// Runs until `cancel` fires or the channel stops delivering events.
    pub async fn run(&self, cancel: CancellationToken) {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_events.max(1)));
        let mut tasks: JoinSet<()> = JoinSet::new();

        info!(
            max_concurrent = self.config.max_concurrent_events,
            "event dispatcher running"
        );

        loop {
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    error!(error = %e, "event task panicked");
                }
            }

            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.channel.receive() => event,
            };
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "channel receive failed, stopping dispatcher");
                    break;
                }
            };

            let triage = self.triage.clone();
            let commands = self.commands.clone();
            tasks.spawn(async move {
                let _permit = permit;
                handle_event(&triage, &commands, event).await;
            });
        }

        info!("event dispatcher stopping");
        shutdown::drain_tasks(
            &mut tasks,
            Duration::from_secs(self.config.drain_timeout_secs),
        )
        .await;
    }
}

async fn handle_event(triage: &TriageController, commands: &CommandHandler, event: ChatEvent) {
    match event {
        ChatEvent::Command(cmd) => match commands.handle(&cmd).await {
            Ok(Some(_)) => debug!(command = %cmd.command, "command handled"),
            Ok(None) => {}
            Err(e) => warn!(command = %cmd.command, error = %e, "command failed"),
        },
        ChatEvent::Control(activation) => match triage.handle(&activation).await {
            Ok(outcome) => debug!(?outcome, "control activation handled"),
            Err(e) => warn!(token = ?activation.token, error = %e, "triage step failed"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiraffe_config::model::StorageConfig;
    use jiraffe_core::types::{MessageBody, OutboundMessage, TopicId, UserId};
    use jiraffe_core::StorageAdapter;
    use jiraffe_storage::SqliteStorage;
    use jiraffe_test_utils::{MockChannel, MockTracker, command_event, control_activation, sample_issue};
    use tokio::sync::Notify;

    use crate::token::Priorities;

    async fn dispatcher(
        dir: &tempfile::TempDir,
        channel: Arc<MockChannel>,
        tracker: Arc<MockTracker>,
    ) -> EventDispatcher {
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        let storage: Arc<dyn StorageAdapter + Send + Sync> = Arc::new(storage);
        let triage = Arc::new(TriageController::new(
            tracker,
            storage.clone(),
            channel.clone(),
            Priorities::new(vec!["Low".into(), "High".into()]),
            "Start progress".into(),
        ));
        let commands = Arc::new(CommandHandler::new(
            storage,
            channel.clone(),
            Arc::new(Notify::new()),
        ));
        EventDispatcher::new(channel, triage, commands, DispatchConfig::default())
    }

    #[tokio::test]
    async fn handles_commands_and_controls_until_channel_closes() {
        let dir = tempfile::tempdir().unwrap();
        let channel = Arc::new(MockChannel::new());
        channel.set_admins(vec![UserId(1)]).await;
        let tracker = Arc::new(MockTracker::new());
        tracker.add_issue(sample_issue("SUP-42", "north-campus")).await;
        let message = channel
            .send(OutboundMessage::text(Some(TopicId(77)), MessageBody::plain("SUP-42")))
            .await
            .unwrap();

        channel
            .inject_event(ChatEvent::Command(command_event(1, None, "help", &[])))
            .await;
        channel
            .inject_event(ChatEvent::Control(control_activation(
                1,
                Some(message),
                Some(TopicId(77)),
                "SUP-42_begin",
            )))
            .await;
        channel.close().await;

        let dispatcher = dispatcher(&dir, channel.clone(), tracker).await;
        tokio::time::timeout(Duration::from_secs(5), dispatcher.run(CancellationToken::new()))
            .await
            .expect("dispatcher did not stop after channel closed");

        // The seeded message plus the /help reply.
        assert_eq!(channel.sent_count().await, 2);
        assert_eq!(channel.acknowledgements().await, ["Progress starting..."]);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let channel = Arc::new(MockChannel::new());
        let dispatcher = dispatcher(&dir, channel, Arc::new(MockTracker::new())).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), dispatcher.run(cancel))
            .await
            .expect("dispatcher ignored cancellation");
    }
}
