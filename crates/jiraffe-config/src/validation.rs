// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL shapes, offset syntax, and priority labels.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::JiraffeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
///
/// Credentials (`telegram.bot_token`, `jira.api_token`, ...) are not required
/// here so that `doctor` can run against a partial config; `serve` checks them
/// when it builds the adapters.
pub fn validate_config(config: &JiraffeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty".to_string()));
    }

    if let Some(url) = config.jira.base_url.as_deref()
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(validation(format!(
            "jira.base_url `{url}` must start with http:// or https://"
        )));
    }

    if config.jira.project.trim().is_empty() {
        errors.push(validation("jira.project must not be empty".to_string()));
    }

    if config.jira.page_size == 0 {
        errors.push(validation("jira.page_size must be at least 1".to_string()));
    }

    if config.jira.start_transition_name.trim().is_empty() {
        errors.push(validation(
            "jira.start_transition_name must not be empty".to_string(),
        ));
    }

    if parse_utc_offset(&config.jira.utc_offset).is_none() {
        errors.push(validation(format!(
            "jira.utc_offset `{}` must look like +HH:MM or -HH:MM",
            config.jira.utc_offset
        )));
    }

    for (name, secs) in [
        ("jira.request_timeout_secs", config.jira.request_timeout_secs),
        (
            "telegram.request_timeout_secs",
            config.telegram.request_timeout_secs,
        ),
        ("sync.poll_interval_secs", config.sync.poll_interval_secs),
        ("sync.campus_refresh_secs", config.sync.campus_refresh_secs),
    ] {
        if secs == 0 {
            errors.push(validation(format!("{name} must be at least 1")));
        }
    }

    if config.sync.max_backoff_secs < config.sync.poll_interval_secs {
        errors.push(validation(format!(
            "sync.max_backoff_secs ({}) must not be smaller than sync.poll_interval_secs ({})",
            config.sync.max_backoff_secs, config.sync.poll_interval_secs
        )));
    }

    if config.dispatch.max_concurrent_events == 0 {
        errors.push(validation(
            "dispatch.max_concurrent_events must be at least 1".to_string(),
        ));
    }

    if config.triage.priorities.is_empty() {
        errors.push(validation(
            "triage.priorities must list at least one priority".to_string(),
        ));
    }

    // Priorities travel inside control tokens in lowercase form.
    let mut seen = HashSet::new();
    for priority in &config.triage.priorities {
        if priority.trim().is_empty() {
            errors.push(validation(
                "triage.priorities must not contain empty labels".to_string(),
            ));
        } else if !seen.insert(priority.to_lowercase()) {
            errors.push(validation(format!(
                "duplicate priority `{priority}` in triage.priorities (compared case-insensitively)"
            )));
        }
    }

    if config.triage.begin_label.trim().is_empty() {
        errors.push(validation("triage.begin_label must not be empty".to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}

/// Parses a `+HH:MM` / `-HH:MM` offset into seconds east of UTC.
///
/// Returns `None` for malformed input or offsets beyond ±23:59.
pub fn parse_utc_offset(offset: &str) -> Option<i32> {
    let (sign, rest) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = JiraffeConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = JiraffeConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn base_url_without_scheme_fails_validation() {
        let mut config = JiraffeConfig::default();
        config.jira.base_url = Some("jira.example.com".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "jira.base_url"));
    }

    #[test]
    fn duplicate_priorities_differing_in_case_fail_validation() {
        let mut config = JiraffeConfig::default();
        config.triage.priorities = vec!["Low".to_string(), "low".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "duplicate priority"));
    }

    #[test]
    fn empty_priorities_fail_validation() {
        let mut config = JiraffeConfig::default();
        config.triage.priorities.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "at least one priority"));
    }

    #[test]
    fn backoff_below_interval_fails_validation() {
        let mut config = JiraffeConfig::default();
        config.sync.poll_interval_secs = 60;
        config.sync.max_backoff_secs = 10;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "max_backoff_secs"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = JiraffeConfig::default();
        config.storage.database_path = " ".to_string();
        config.jira.page_size = 0;
        config.dispatch.max_concurrent_events = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn utc_offsets_parse() {
        assert_eq!(parse_utc_offset("+03:00"), Some(3 * 3600));
        assert_eq!(parse_utc_offset("-05:30"), Some(-(5 * 3600 + 30 * 60)));
        assert_eq!(parse_utc_offset("+00:00"), Some(0));
        assert_eq!(parse_utc_offset("03:00"), None);
        assert_eq!(parse_utc_offset("+3:00"), None);
        assert_eq!(parse_utc_offset("+24:00"), None);
        assert_eq!(parse_utc_offset(""), None);
    }
}
