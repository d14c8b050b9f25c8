// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue relay and triage workflow for jiraffe.
//!
//! The [`Relay`] is the central coordinator that:
//! - Polls the tracker per campus and posts new issues into campus topics
//! - Dispatches chat commands and control activations to a bounded worker pool
//! - Drives the triage workflow on posted issues
//! - Handles graceful shutdown

pub mod auth;
pub mod commands;
pub mod dispatch;
pub mod notifier;
pub mod reconcile;
pub mod recording;
pub mod render;
pub mod shutdown;
pub mod token;
pub mod triage;

use std::sync::Arc;

use jiraffe_config::model::JiraffeConfig;
use jiraffe_core::error::JiraffeError;
use jiraffe_core::{ChannelAdapter, StorageAdapter, TrackerAdapter};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub use crate::commands::CommandHandler;
pub use crate::dispatch::EventDispatcher;
pub use crate::notifier::Notifier;
pub use crate::reconcile::{CampusSnapshot, PassReport, Reconciler};
pub use crate::token::{Priorities, TriageToken};
pub use crate::triage::{TriageController, TriageOutcome};

/// Wires the reconciliation loop and the event dispatcher around shared adapters.
pub struct Relay {
    reconciler: Reconciler,
    dispatcher: EventDispatcher,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
}

impl Relay {
    /// Creates a relay over already initialized adapters.
    ///
    /// `channel` must be connected before [`Relay::run`] is called.
    pub fn new(
        config: &JiraffeConfig,
        tracker: Arc<dyn TrackerAdapter + Send + Sync>,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
    ) -> Self {
        recording::register_metrics();

        let refresh = Arc::new(Notify::new());
        let notifier = Notifier::new(channel.clone(), config.triage.begin_label.clone());
        let reconciler = Reconciler::new(
            tracker.clone(),
            storage.clone(),
            notifier,
            config.sync.clone(),
            refresh.clone(),
        );

        let triage = Arc::new(TriageController::new(
            tracker,
            storage.clone(),
            channel.clone(),
            Priorities::new(config.triage.priorities.clone()),
            config.jira.start_transition_name.clone(),
        ));
        let commands = Arc::new(CommandHandler::new(storage.clone(), channel.clone(), refresh));
        let dispatcher = EventDispatcher::new(channel, triage, commands, config.dispatch.clone());

        info!(
            agent_name = config.agent.name.as_str(),
            "relay initialized"
        );

        Self {
            reconciler,
            dispatcher,
            storage,
        }
    }

    /// Runs until `cancel` fires or the channel closes, then closes storage.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), JiraffeError> {
        info!("relay running");

        // A closed channel ends the dispatcher on its own; the child token
        // lets it take the reconciliation loop down with it.
        let cancel = cancel.child_token();
        let reconcile = tokio::spawn(self.reconciler.run(cancel.clone()));

        self.dispatcher.run(cancel.clone()).await;
        cancel.cancel();

        if let Err(e) = reconcile.await {
            error!(error = %e, "reconciliation task failed");
        }

        self.storage.close().await?;

        info!("relay stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use jiraffe_config::model::StorageConfig;
    use jiraffe_storage::SqliteStorage;
    use jiraffe_test_utils::{MockChannel, MockTracker};

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();

        let relay = Relay::new(
            &JiraffeConfig::default(),
            Arc::new(MockTracker::new()),
            Arc::new(storage),
            Arc::new(MockChannel::new()),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(relay.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("relay did not stop")
            .unwrap()
            .unwrap();
    }
}
