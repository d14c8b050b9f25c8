// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config error reports.
//!
//! Figment errors are turned into [`ConfigError`]s that miette renders with
//! the offending line of `jiraffe.toml`. Unknown keys get a suggestion from the
//! keys of their own section, and every key names the environment variables
//! that can set it, including the unprefixed `JIRA_URL`, `JIRA_TOKEN` and
//! `TELEGRAM_TOKEN`.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

use crate::loader::LEGACY_VARS;

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Key names people carry over from the environment variables or older
/// deployments, as `(section, written, meant)`. Checked before fuzzy matching.
const RENAMED_KEYS: &[(&str, &str, &str)] = &[
    ("jira", "url", "base_url"),
    ("jira", "token", "api_token"),
    ("telegram", "token", "bot_token"),
    ("telegram", "chat", "chat_id"),
    ("storage", "path", "database_path"),
    ("sync", "interval", "poll_interval_secs"),
];

/// A configuration problem, ready for miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", scope(.section))]
    #[diagnostic(
        code(jiraffe::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys, env_vars))
    )]
    UnknownKey {
        key: String,
        /// Table the key was written in, `None` at the top level.
        section: Option<String>,
        suggestion: Option<String>,
        valid_keys: String,
        /// Variables that set the suggested key, comma separated.
        env_vars: String,
        #[label("not a jiraffe setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(
        code(jiraffe::config::invalid_type),
        help("expected {expected}; the environment can also set it as {env_vars}")
    )]
    InvalidType {
        /// Dotted path, e.g. `jira.page_size`.
        key: String,
        detail: String,
        expected: String,
        env_vars: String,
        #[label("set here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but makes no sense for the relay.
    #[error("validation error: {message}")]
    #[diagnostic(code(jiraffe::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(jiraffe::config::other))]
    Other(String),
}

fn scope(section: &Option<String>) -> String {
    match section {
        Some(section) => format!("[{section}]"),
        None => "the top level".to_string(),
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str, env_vars: &str) -> String {
    let mut help = match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    };
    if !env_vars.is_empty() {
        help.push_str(&format!("\nit can also be set with {env_vars}"));
    }
    help
}

/// Environment variables that set the dotted config `path`.
///
/// The `JIRAFFE_` form always comes first, followed by the unprefixed name
/// when the key has one.
pub fn env_vars_for(path: &str) -> Vec<String> {
    let mut vars = vec![format!(
        "JIRAFFE_{}",
        path.replace('.', "_").to_ascii_uppercase()
    )];
    vars.extend(
        LEGACY_VARS
            .iter()
            .filter(|(_, target)| *target == path)
            .map(|(var, _)| (*var).to_string()),
    );
    vars
}

/// Convert a `figment::Error`, which may hold several errors, into reports.
///
/// `sources` pairs each config file path with its content and is only used
/// to point at the offending line.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|error| convert(&error, sources)).collect()
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => unknown_key(error, field, expected, sources),
        Kind::InvalidType(actual, expected) | Kind::InvalidValue(actual, expected) => {
            let key = error.path.join(".");
            let (span, src) = match error.path.as_slice() {
                [section, .., last] => locate(error, Some(section.as_str()), last, sources),
                [last] => locate(error, None, last, sources),
                [] => (None, None),
            };
            ConfigError::InvalidType {
                env_vars: env_vars_for(&key).join(", "),
                key,
                detail: format!("found {actual}"),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

fn unknown_key(
    error: &figment::Error,
    field: &str,
    expected: &[&str],
    sources: &[(String, String)],
) -> ConfigError {
    // Figment may or may not have pushed the field itself onto the path.
    let section = error
        .path
        .first()
        .filter(|first| first.as_str() != field)
        .cloned();

    let suggestion = section
        .as_deref()
        .and_then(|section| renamed_key(section, field))
        .map(str::to_string)
        .or_else(|| suggest_key(field, expected));

    let env_vars = match (&section, &suggestion) {
        (Some(section), Some(key)) => env_vars_for(&format!("{section}.{key}")).join(", "),
        _ => String::new(),
    };

    let (span, src) = locate(error, section.as_deref(), field, sources);

    ConfigError::UnknownKey {
        key: field.to_string(),
        section,
        suggestion,
        valid_keys: expected.join(", "),
        env_vars,
        span,
        src,
    }
}

fn renamed_key(section: &str, key: &str) -> Option<&'static str> {
    RENAMED_KEYS
        .iter()
        .find(|(s, written, _)| *s == section && *written == key)
        .map(|(_, _, meant)| *meant)
}

/// Suggest the closest of `valid_keys` to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

fn locate(
    error: &figment::Error,
    section: Option<&str>,
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source = error.metadata.as_ref().and_then(|m| m.source.as_ref());
    let found = match source {
        Some(figment::Source::File(path)) => sources
            .iter()
            .find(|(name, _)| Path::new(name) == path.as_path()),
        // Inline strings carry no path; there is only one candidate.
        Some(_) if sources.len() == 1 => sources.first(),
        _ => None,
    };

    let Some((name, content)) = found else {
        return (None, None);
    };
    match locate_key(content, section, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key = ...` inside the `[section]` table of a TOML
/// document, or among the top-level keys when `section` is `None`.
pub fn locate_key(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
            continue;
        }
        if current != section {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix(key) else {
            continue;
        };
        if rest.trim_start().starts_with('=') {
            return Some(start + line.len() - trimmed.len());
        }
    }
    None
}

/// Render `errors` to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    eprintln!(
        "jiraffe: {} configuration problem{} found",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_typo_is_suggested() {
        let valid = &["base_url", "api_token", "project", "page_size"];
        assert_eq!(suggest_key("pagesize", valid), Some("page_size".to_string()));
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn renamed_key_wins_over_fuzzy_match() {
        assert_eq!(renamed_key("jira", "url"), Some("base_url"));
        assert_eq!(renamed_key("telegram", "token"), Some("bot_token"));
        assert_eq!(renamed_key("sync", "url"), None);
    }

    #[test]
    fn env_vars_include_unprefixed_name() {
        assert_eq!(
            env_vars_for("jira.api_token"),
            vec!["JIRAFFE_JIRA_API_TOKEN", "JIRA_TOKEN"]
        );
        assert_eq!(env_vars_for("sync.jitter_ms"), vec!["JIRAFFE_SYNC_JITTER_MS"]);
    }

    #[test]
    fn locate_key_stays_in_its_table() {
        let content = "[telegram]\nrequest_timeout_secs = 5\n\n[jira]\n  request_timeout_secs = 9\n";
        let o = locate_key(content, Some("jira"), "request_timeout_secs").expect("found");
        assert!(content[o..].starts_with("request_timeout_secs = 9"));
    }

    #[test]
    fn locate_key_ignores_prefix_matches() {
        let content = "[sync]\npoll_interval_secs_old = 1\npoll_interval_secs = 2\n";
        let o = locate_key(content, Some("sync"), "poll_interval_secs").expect("found");
        assert!(content[o..].starts_with("poll_interval_secs = 2"));
    }

    #[test]
    fn locate_key_missing_table() {
        let content = "[telegram]\nchat_id = 1\n";
        assert_eq!(locate_key(content, Some("jira"), "chat_id"), None);
        assert_eq!(locate_key(content, None, "chat_id"), None);
    }
}
