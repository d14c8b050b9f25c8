// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for jiraffe.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level jiraffe configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JiraffeConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot and group chat settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Jira REST API settings.
    #[serde(default)]
    pub jira: JiraConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reconciliation loop scheduling.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Triage workflow settings.
    #[serde(default)]
    pub triage: TriageConfig,

    /// Chat event worker pool settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Instance name, used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "jiraffe".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Id of the forum supergroup issues are relayed into.
    #[serde(default)]
    pub chat_id: Option<i64>,

    /// Timeout for each Bot API request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Skip updates that queued up while the bot was offline.
    #[serde(default = "default_drop_pending_updates")]
    pub drop_pending_updates: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            request_timeout_secs: default_request_timeout_secs(),
            drop_pending_updates: default_drop_pending_updates(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_drop_pending_updates() -> bool {
    true
}

/// Jira REST API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JiraConfig {
    /// Base URL of the Jira instance, e.g. `https://jira.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Personal access token, sent as a bearer token.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Project key the search is restricted to.
    #[serde(default = "default_project")]
    pub project: String,

    /// Status name that marks an issue as new.
    #[serde(default = "default_open_status")]
    pub open_status: String,

    /// Maximum issues fetched per campus per pass.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Name of the workflow transition executed when triage completes.
    #[serde(default = "default_start_transition_name")]
    pub start_transition_name: String,

    /// Timeout for each REST request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// UTC offset creation timestamps are shown in, as `+HH:MM` or `-HH:MM`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            project: default_project(),
            open_status: default_open_status(),
            page_size: default_page_size(),
            start_transition_name: default_start_transition_name(),
            request_timeout_secs: default_request_timeout_secs(),
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_project() -> String {
    "SUP".to_string()
}

fn default_open_status() -> String {
    "Open".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_start_transition_name() -> String {
    "Start progress".to_string()
}

fn default_utc_offset() -> String {
    "+03:00".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("jiraffe").join("jiraffe.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("jiraffe.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Reconciliation loop scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Delay between the end of one pass and the start of the next.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound of the random delay added to each interval.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Ceiling for the delay after consecutive failed passes.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// How often the campus list is reloaded from storage.
    #[serde(default = "default_campus_refresh_secs")]
    pub campus_refresh_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            jitter_ms: default_jitter_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            campus_refresh_secs: default_campus_refresh_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_jitter_ms() -> u64 {
    2000
}

fn default_max_backoff_secs() -> u64 {
    600
}

fn default_campus_refresh_secs() -> u64 {
    300
}

/// Triage workflow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Priority labels offered after "Begin", in display order.
    #[serde(default = "default_priorities")]
    pub priorities: Vec<String>,

    /// Label of the control attached to freshly posted issues.
    #[serde(default = "default_begin_label")]
    pub begin_label: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            priorities: default_priorities(),
            begin_label: default_begin_label(),
        }
    }
}

fn default_priorities() -> Vec<String> {
    vec!["Low".to_string(), "Medium".to_string(), "High".to_string()]
}

fn default_begin_label() -> String {
    "Begin".to_string()
}

/// Chat event worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum number of chat events handled at the same time.
    #[serde(default = "default_max_concurrent_events")]
    pub max_concurrent_events: usize,

    /// How long shutdown waits for in-flight events.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_events: default_max_concurrent_events(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_max_concurrent_events() -> usize {
    8
}

fn default_drain_timeout_secs() -> u64 {
    30
}
