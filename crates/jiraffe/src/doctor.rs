// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `jiraffe doctor` command implementation.
//!
//! Runs diagnostic checks against the relay's environment: configuration,
//! the SQLite database, Jira reachability and the Telegram bot.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use jiraffe_config::model::JiraffeConfig;
use jiraffe_core::PluginAdapter;
use jiraffe_core::types::HealthStatus;
use jiraffe_jira::JiraTracker;
use jiraffe_telegram::TelegramChannel;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `jiraffe doctor` command.
///
/// With `deep`, also checks database integrity and the memory baseline.
/// With `plain`, disables colored output.
pub async fn run_doctor(
    config: &JiraffeConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![
        check_config(config_path).await,
        check_database(&config.storage.database_path).await,
        check_jira(config).await,
        check_telegram(config).await,
    ];

    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_memory_baseline().await);
    }

    println!();
    println!("  jiraffe doctor");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!("{}", format_line(result, use_color));
    }

    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }

    println!();
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<16} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<16} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Check configuration loads without errors.
async fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => jiraffe_config::load_and_validate_path(path),
        None => jiraffe_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check database file exists and can be opened.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "Database",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let campuses: Result<i64, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM campuses", [], |row| row.get(0))?;
            Ok(count)
        })
        .await;

    match campuses {
        Ok(count) => CheckResult::new(
            "Database",
            CheckStatus::Pass,
            format!("connected, {count} campus(es)"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

fn health_result(
    name: &str,
    health: Result<HealthStatus, jiraffe_core::JiraffeError>,
    start: Instant,
) -> CheckResult {
    match health {
        Ok(HealthStatus::Healthy) => CheckResult::new(name, CheckStatus::Pass, "reachable", start),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new(name, CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new(name, CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new(name, CheckStatus::Fail, format!("error: {e}"), start),
    }
}

/// Check Jira credentials against `/myself`.
async fn check_jira(config: &JiraffeConfig) -> CheckResult {
    let start = Instant::now();
    match JiraTracker::new(&config.jira) {
        Ok(tracker) => health_result("Jira", tracker.health_check().await, start),
        Err(e) => CheckResult::new(
            "Jira",
            CheckStatus::Warn,
            format!("not configured: {e}"),
            start,
        ),
    }
}

/// Check the Telegram bot token via `getMe`.
async fn check_telegram(config: &JiraffeConfig) -> CheckResult {
    let start = Instant::now();
    match TelegramChannel::new(config.telegram.clone()) {
        Ok(channel) => health_result("Telegram", channel.health_check().await, start),
        Err(e) => CheckResult::new(
            "Telegram",
            CheckStatus::Warn,
            format!("not configured: {e}"),
            start,
        ),
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "DB integrity",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let result: Result<Vec<String>, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await;

    match result {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

/// Deep check: memory baseline via jemalloc.
async fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);

        CheckResult::new(
            "Memory baseline",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new(
            "Memory baseline",
            CheckStatus::Warn,
            "jemalloc not available on MSVC",
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiraffe_core::StorageAdapter;
    use jiraffe_storage::SqliteStorage;

    #[tokio::test]
    async fn check_config_passes_with_defaults_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jiraffe.toml");
        std::fs::write(&path, "[agent]\nname = \"doctor-test\"\n").unwrap();

        let result = check_config(Some(&path)).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.name, "Configuration");
    }

    #[tokio::test]
    async fn check_config_fails_on_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jiraffe.toml");
        std::fs::write(&path, "[agent]\nnmae = \"typo\"\n").unwrap();

        let result = check_config(Some(&path)).await;
        assert_eq!(result.status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn check_database_missing_warns() {
        let result = check_database("/tmp/nonexistent-jiraffe-test-xyz.db").await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn check_database_counts_campuses() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = JiraffeConfig::default();
        config.storage.database_path = dir.path().join("j.db").to_string_lossy().to_string();
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await.unwrap();
        storage.close().await.unwrap();

        let result = check_database(&config.storage.database_path).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
        assert!(result.message.contains("0 campus"));

        let integrity = check_db_integrity(&config.storage.database_path).await;
        assert_eq!(integrity.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn check_db_integrity_missing_warns() {
        let result = check_db_integrity("/tmp/nonexistent-jiraffe-test-xyz.db").await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn unconfigured_remotes_warn() {
        let mut config = JiraffeConfig::default();
        config.jira.base_url = None;
        config.telegram.bot_token = None;

        assert_eq!(check_jira(&config).await.status, CheckStatus::Warn);
        assert_eq!(check_telegram(&config).await.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn check_memory_baseline_passes() {
        let result = check_memory_baseline().await;
        assert!(result.status == CheckStatus::Pass || result.status == CheckStatus::Warn);
    }

    #[test]
    fn plain_lines_carry_status_tags() {
        let result = CheckResult {
            name: "Jira".to_string(),
            status: CheckStatus::Warn,
            message: "not configured".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = format_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("not configured (3ms)"));
    }
}
