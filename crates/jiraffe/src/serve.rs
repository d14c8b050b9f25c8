// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `jiraffe serve` command implementation.
//!
//! Opens SQLite storage, builds the Jira and Telegram adapters from
//! configuration and runs the relay until SIGINT/SIGTERM.

use std::sync::Arc;

use jiraffe_agent::{Relay, shutdown};
use jiraffe_config::model::JiraffeConfig;
use jiraffe_core::error::JiraffeError;
use jiraffe_core::types::HealthStatus;
use jiraffe_core::{ChannelAdapter, PluginAdapter, StorageAdapter};
use jiraffe_jira::JiraTracker;
use jiraffe_storage::SqliteStorage;
use jiraffe_telegram::TelegramChannel;
use tracing::{error, info, warn};

/// Runs the `jiraffe serve` command.
pub async fn run_serve(config: JiraffeConfig) -> Result<(), JiraffeError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, "starting jiraffe serve");

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let tracker = JiraTracker::new(&config.jira).map_err(|e| {
        error!(error = %e, "failed to initialize Jira tracker");
        eprintln!(
            "error: Jira credentials required. Set jira.base_url and jira.api_token \
             in config, or JIRA_URL and JIRA_TOKEN environment variables."
        );
        e
    })?;
    match tracker.health_check().await {
        Ok(HealthStatus::Healthy) => info!("jira reachable"),
        Ok(status) => warn!(?status, "jira not healthy at startup, continuing"),
        Err(e) => warn!(error = %e, "jira health check failed, continuing"),
    }
    let tracker = Arc::new(tracker);

    let mut channel = TelegramChannel::new(config.telegram.clone()).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token and chat id required. Set telegram.bot_token \
             and telegram.chat_id in config, or the TELEGRAM_TOKEN environment variable."
        );
        e
    })?;
    channel.connect().await?;
    let channel = Arc::new(channel);

    let cancel = shutdown::install_signal_handler();

    let relay = Relay::new(&config, tracker.clone(), storage.clone(), channel.clone());
    let result = relay.run(cancel).await;

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "telegram shutdown failed");
    }
    if let Err(e) = tracker.shutdown().await {
        warn!(error = %e, "jira shutdown failed");
    }

    match &result {
        Ok(()) => info!("jiraffe serve shutdown complete"),
        Err(e) => error!(error = %e, "relay stopped with error"),
    }
    result
}

fn default_filter(log_level: &str) -> String {
    format!("jiraffe={log_level},warn")
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_scopes_level_to_jiraffe() {
        assert_eq!(default_filter("debug"), "jiraffe=debug,warn");
    }

    #[test]
    fn default_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new(default_filter("info")).is_ok());
    }

    #[tokio::test]
    async fn serve_without_jira_credentials_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = JiraffeConfig::default();
        config.storage.database_path = dir.path().join("j.db").to_string_lossy().to_string();
        config.jira.base_url = None;
        config.jira.api_token = None;

        // Tracing is global; only this test installs it.
        let err = run_serve(config).await.unwrap_err();
        assert!(matches!(err, JiraffeError::Config(_)));
    }
}
