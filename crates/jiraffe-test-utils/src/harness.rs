// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the relay's reconciler, triage controller and
//! command handler over a temp SQLite database and mock tracker and chat.

use std::sync::Arc;

use jiraffe_agent::{
    CampusSnapshot, CommandHandler, Notifier, PassReport, Priorities, Reconciler,
    TriageController, TriageOutcome,
};
use jiraffe_config::model::{JiraffeConfig, StorageConfig};
use jiraffe_core::types::{Campus, MessageRef, TopicId, UserId};
use jiraffe_core::{JiraffeError, StorageAdapter};
use jiraffe_storage::SqliteStorage;
use tokio::sync::Notify;

use crate::mock_channel::{MockChannel, command_event, control_activation};
use crate::mock_tracker::MockTracker;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    admins: Vec<u64>,
    campuses: Vec<(String, i32)>,
    config: JiraffeConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            admins: vec![TestHarness::ADMIN],
            campuses: Vec::new(),
            config: JiraffeConfig::default(),
        }
    }

    /// Replace the default administrator set.
    pub fn with_admins(mut self, admins: Vec<u64>) -> Self {
        self.admins = admins;
        self
    }

    /// Seed a campus bound to `topic`.
    pub fn with_campus(mut self, name: &str, topic: i32) -> Self {
        self.campuses.push((name.to_string(), topic));
        self
    }

    /// Use a custom configuration. `storage` is always overridden.
    pub fn with_config(mut self, config: JiraffeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, JiraffeError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| JiraffeError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter + Send + Sync> = Arc::new(storage);
        for (name, topic) in &self.campuses {
            storage
                .insert_campus(&Campus {
                    name: name.clone(),
                    topic_id: TopicId(*topic),
                })
                .await?;
        }

        let tracker = Arc::new(MockTracker::new());
        let channel = Arc::new(MockChannel::new());
        channel
            .set_admins(self.admins.into_iter().map(UserId).collect())
            .await;

        let refresh = Arc::new(Notify::new());
        let reconciler = Reconciler::new(
            tracker.clone(),
            storage.clone(),
            Notifier::new(channel.clone(), config.triage.begin_label.clone()),
            config.sync.clone(),
            refresh.clone(),
        );
        let triage = TriageController::new(
            tracker.clone(),
            storage.clone(),
            channel.clone(),
            Priorities::new(config.triage.priorities.clone()),
            config.jira.start_transition_name.clone(),
        );
        let commands = CommandHandler::new(storage.clone(), channel.clone(), refresh.clone());

        Ok(TestHarness {
            tracker,
            channel,
            storage,
            reconciler,
            triage,
            commands,
            refresh,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock issue tracker.
    pub tracker: Arc<MockTracker>,
    /// The mock group chat.
    pub channel: Arc<MockChannel>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter + Send + Sync>,
    pub reconciler: Reconciler,
    pub triage: TriageController,
    pub commands: CommandHandler,
    /// Signalled when a campus is created.
    pub refresh: Arc<Notify>,
    pub config: JiraffeConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Sender id that is an administrator unless the builder says otherwise.
    pub const ADMIN: u64 = 1;

    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Load the campus list and run one reconciliation pass.
    pub async fn run_pass(&self) -> Result<PassReport, JiraffeError> {
        let snapshot = CampusSnapshot::load(self.storage.as_ref()).await?;
        Ok(self.reconciler.run_pass(&snapshot).await)
    }

    /// Activate a control on a posted message as `sender`.
    pub async fn activate(
        &self,
        sender: u64,
        message: MessageRef,
        token: &str,
    ) -> Result<TriageOutcome, JiraffeError> {
        let topic = self
            .channel
            .message(message.message_id)
            .await
            .and_then(|m| m.topic);
        let activation = control_activation(sender, Some(message), topic, token);
        self.triage.handle(&activation).await
    }

    /// Run a slash command as `sender` inside `topic`.
    pub async fn command(
        &self,
        sender: u64,
        topic: Option<TopicId>,
        command: &str,
        args: &[&str],
    ) -> Result<Option<String>, JiraffeError> {
        self.commands
            .handle(&command_event(sender, topic, command, args))
            .await
    }
}
