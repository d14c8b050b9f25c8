// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the jiraffe configuration system.

use figment::Jail;
use jiraffe_config::diagnostic::{suggest_key, ConfigError};
use jiraffe_config::model::JiraffeConfig;
use jiraffe_config::{
    load_and_validate_path, load_and_validate_str, load_config, load_config_from_str,
};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_jiraffe_config() {
    let toml = r#"
[agent]
name = "relay-north"
log_level = "debug"

[telegram]
bot_token = "123:ABC"
chat_id = -1001234567890
request_timeout_secs = 10
drop_pending_updates = false

[jira]
base_url = "https://jira.example.com"
api_token = "pat-123"
project = "HELP"
open_status = "To Do"
page_size = 50
start_transition_name = "Start Progress"
utc_offset = "+05:00"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[sync]
poll_interval_secs = 15
jitter_ms = 0
max_backoff_secs = 120
campus_refresh_secs = 60

[triage]
priorities = ["Minor", "Major"]
begin_label = "Start"

[dispatch]
max_concurrent_events = 2
drain_timeout_secs = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "relay-north");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.chat_id, Some(-1001234567890));
    assert_eq!(config.telegram.request_timeout_secs, 10);
    assert!(!config.telegram.drop_pending_updates);
    assert_eq!(config.jira.base_url.as_deref(), Some("https://jira.example.com"));
    assert_eq!(config.jira.api_token.as_deref(), Some("pat-123"));
    assert_eq!(config.jira.project, "HELP");
    assert_eq!(config.jira.open_status, "To Do");
    assert_eq!(config.jira.page_size, 50);
    assert_eq!(config.jira.start_transition_name, "Start Progress");
    assert_eq!(config.jira.utc_offset, "+05:00");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.sync.poll_interval_secs, 15);
    assert_eq!(config.sync.jitter_ms, 0);
    assert_eq!(config.sync.max_backoff_secs, 120);
    assert_eq!(config.sync.campus_refresh_secs, 60);
    assert_eq!(config.triage.priorities, vec!["Minor", "Major"]);
    assert_eq!(config.triage.begin_label, "Start");
    assert_eq!(config.dispatch.max_concurrent_events, 2);
    assert_eq!(config.dispatch.drain_timeout_secs, 5);
}

/// Unknown field in [jira] section produces an UnknownField error.
#[test]
fn unknown_field_in_jira_produces_error() {
    let toml = r#"
[jira]
pagesize = 10
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("pagesize"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing sections fall back to defaults.
#[test]
fn missing_optional_sections_use_defaults() {
    let toml = r#"
[telegram]
chat_id = -100
"#;

    let config = load_config_from_str(toml).expect("partial TOML should deserialize");
    assert_eq!(config.telegram.chat_id, Some(-100));
    assert_eq!(config.agent.name, "jiraffe");
    assert_eq!(config.jira.project, "SUP");
    assert_eq!(config.triage.begin_label, "Begin");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[anthropic]
api_key = "x"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("anthropic"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// `JIRAFFE_JIRA_API_TOKEN` maps to `jira.api_token`, not `jira.api.token`.
#[test]
fn prefixed_env_vars_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "jiraffe.toml",
            r#"
[jira]
api_token = "from-file"
page_size = 5
"#,
        )?;
        jail.set_env("JIRAFFE_JIRA_API_TOKEN", "from-env");
        jail.set_env("JIRAFFE_TELEGRAM_CHAT_ID", "-1009");
        jail.set_env("JIRAFFE_SYNC_POLL_INTERVAL_SECS", "45");

        let config = load_config()?;
        assert_eq!(config.jira.api_token.as_deref(), Some("from-env"));
        assert_eq!(config.jira.page_size, 5);
        assert_eq!(config.telegram.chat_id, Some(-1009));
        assert_eq!(config.sync.poll_interval_secs, 45);
        Ok(())
    });
}

/// The unprefixed variables still work, but lose against `JIRAFFE_*`.
#[test]
fn legacy_env_vars_are_honored() {
    Jail::expect_with(|jail| {
        jail.set_env("JIRA_URL", "https://legacy.example.com");
        jail.set_env("JIRA_TOKEN", "legacy-token");
        jail.set_env("TELEGRAM_TOKEN", "1:legacy");
        jail.set_env("JIRAFFE_JIRA_API_TOKEN", "new-token");

        let config = load_config()?;
        assert_eq!(config.jira.base_url.as_deref(), Some("https://legacy.example.com"));
        assert_eq!(config.jira.api_token.as_deref(), Some("new-token"));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("1:legacy"));
        Ok(())
    });
}

/// An explicit config path skips the XDG hierarchy but still reads env vars.
#[test]
fn explicit_path_is_loaded_and_validated() {
    Jail::expect_with(|jail| {
        jail.create_file("jiraffe.toml", "[jira]\nproject = \"IGNORED\"\n")?;
        jail.create_file("custom.toml", "[jira]\nproject = \"OPS\"\n")?;
        jail.set_env("JIRAFFE_AGENT_NAME", "from-env");

        let path = jail.directory().join("custom.toml");
        let config = load_and_validate_path(&path).expect("custom config should validate");
        assert_eq!(config.jira.project, "OPS");
        assert_eq!(config.agent.name, "from-env");
        Ok(())
    });
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: JiraffeConfig = Figment::new()
        .merge(Serialized::defaults(JiraffeConfig::default()))
        .merge(Toml::file("/nonexistent/path/jiraffe.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.agent.name, "jiraffe");
}

// ============================================================================
// Diagnostic tests
// ============================================================================

/// Unknown key "bot_tken" in [telegram] produces suggestion "did you mean `bot_token`?"
#[test]
fn diagnostic_bot_tken_suggests_bot_token() {
    let valid_keys = &["bot_token", "chat_id", "request_timeout_secs", "drop_pending_updates"];
    let suggestion = suggest_key("bot_tken", valid_keys);
    assert_eq!(suggestion, Some("bot_token".to_string()));
}

/// Error output from load_and_validate_str carries the key, a suggestion and valid keys.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[sync]
poll_intervall_secs = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "poll_intervall_secs"
                && suggestion.as_deref() == Some("poll_interval_secs")
                && valid_keys.contains("jitter_ms")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error with suggestion, got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[jira]
page_size = "twenty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::InvalidType { .. })
            || e.to_string().contains("page_size")),
        "error should mention type mismatch, got: {errors:?}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "pagesize".to_string(),
        section: Some("jira".to_string()),
        suggestion: Some("page_size".to_string()),
        valid_keys: "base_url, api_token, project, page_size".to_string(),
        env_vars: "JIRAFFE_JIRA_PAGE_SIZE".to_string(),
        span: None,
        src: None,
    };

    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `page_size`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("pagesize"), "rendered report should mention the key");
    assert!(buf.contains("[jira]"), "rendered report should name the table");
}

/// A key spelled like its environment variable points at the real key and the variables.
#[test]
fn diagnostic_jira_url_suggests_base_url() {
    let toml = r#"
[jira]
url = "https://jira.example.com"
"#;

    let errors = load_and_validate_str(toml).expect_err("url is not a jira key");
    let error = errors
        .iter()
        .find(|e| matches!(e, ConfigError::UnknownKey { .. }))
        .expect("unknown key error");
    let ConfigError::UnknownKey { key, section, suggestion, env_vars, .. } = error else {
        unreachable!();
    };
    assert_eq!(key, "url");
    assert_eq!(section.as_deref(), Some("jira"));
    assert_eq!(suggestion.as_deref(), Some("base_url"));
    assert_eq!(env_vars, "JIRAFFE_JIRA_BASE_URL, JIRA_URL");

    let help = miette::Diagnostic::help(error).expect("help").to_string();
    assert!(help.contains("did you mean `base_url`"), "got: {help}");
    assert!(help.contains("JIRA_URL"), "got: {help}");
}

/// A misspelled table name is suggested among the jiraffe sections.
#[test]
fn diagnostic_unknown_section_suggests_section() {
    let toml = r#"
[telgram]
chat_id = 1
"#;

    let errors = load_and_validate_str(toml).expect_err("telgram is not a section");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::UnknownKey { key, section: None, suggestion, valid_keys, .. } if {
            key == "telgram"
                && suggestion.as_deref() == Some("telegram")
                && valid_keys.contains("dispatch")
        })),
        "got: {errors:?}"
    );
}

/// Type errors name the variables that can set the key.
#[test]
fn diagnostic_invalid_type_names_env_vars() {
    let toml = r#"
[telegram]
bot_token = 42
"#;

    let errors = load_and_validate_str(toml).expect_err("token must be a string");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::InvalidType { key, env_vars, .. } if {
            key == "telegram.bot_token" && env_vars == "JIRAFFE_TELEGRAM_BOT_TOKEN, TELEGRAM_TOKEN"
        })),
        "got: {errors:?}"
    );
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_bad_offset() {
    let toml = r#"
[jira]
utc_offset = "Europe/Moscow"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad offset should fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("utc_offset"))
    ));
}

/// load_and_validate_str with valid TOML returns Ok config.
#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[triage]
priorities = ["Low", "Medium"]
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.triage.priorities, vec!["Low", "Medium"]);
}
