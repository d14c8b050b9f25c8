// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./jiraffe.toml` > `~/.config/jiraffe/jiraffe.toml` > `/etc/jiraffe/jiraffe.toml`
//! with environment variable overrides via `JIRAFFE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::JiraffeConfig;

/// Config sections, used to split `JIRAFFE_SECTION_KEY` into `section.key`.
pub(crate) const SECTIONS: &[&str] = &[
    "agent", "telegram", "jira", "storage", "sync", "triage", "dispatch",
];

/// Unprefixed variables kept for existing deployments, with the key they set.
pub(crate) const LEGACY_VARS: &[(&str, &str)] = &[
    ("JIRA_URL", "jira.base_url"),
    ("JIRA_TOKEN", "jira.api_token"),
    ("TELEGRAM_TOKEN", "telegram.bot_token"),
];

/// Config files searched by [`load_config`], lowest precedence first.
pub fn standard_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/jiraffe/jiraffe.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("jiraffe/jiraffe.toml"));
    }
    paths.push(PathBuf::from("jiraffe.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/jiraffe/jiraffe.toml` (system-wide)
/// 3. `~/.config/jiraffe/jiraffe.toml` (user XDG config)
/// 4. `./jiraffe.toml` (local directory)
/// 5. `JIRA_URL`, `JIRA_TOKEN`, `TELEGRAM_TOKEN`
/// 6. `JIRAFFE_*` environment variables
pub fn load_config() -> Result<JiraffeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults (no files, no env).
///
/// Used for testing.
pub fn load_config_from_str(toml_content: &str) -> Result<JiraffeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JiraffeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
///
/// The XDG hierarchy is skipped entirely.
pub fn load_config_from_path(path: &Path) -> Result<JiraffeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JiraffeConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    let figment = standard_paths().into_iter().fold(
        Figment::new().merge(Serialized::defaults(JiraffeConfig::default())),
        |figment, path| figment.merge(Toml::file(path)),
    );
    figment.merge(legacy_env_provider()).merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `JIRAFFE_JIRA_API_TOKEN`
/// must map to `jira.api_token`, not `jira.api.token`.
fn env_provider() -> Env {
    Env::prefixed("JIRAFFE_")
        .map(|key| map_section_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Reads the [`LEGACY_VARS`].
fn legacy_env_provider() -> Env {
    let names: Vec<&str> = LEGACY_VARS.iter().map(|(var, _)| *var).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_VARS
            .iter()
            .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
            .map(|(_, path)| (*path).into())
            .unwrap_or_else(|| key.into())
    })
}

/// Maps a lowercased, prefix-stripped variable name onto its dotted config path.
///
/// Only the first underscore after a known section name becomes a dot.
pub(crate) fn map_section_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_prefix_becomes_dot() {
        assert_eq!(map_section_key("jira_api_token"), "jira.api_token");
        assert_eq!(map_section_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(map_section_key("sync_poll_interval_secs"), "sync.poll_interval_secs");
    }

    #[test]
    fn local_file_has_highest_precedence() {
        let paths = standard_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/jiraffe/jiraffe.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("jiraffe.toml")));
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_section_key("unknown_key"), "unknown_key");
    }

    #[test]
    fn section_name_must_be_followed_by_underscore() {
        // `jiraffe_x` must not be read as section `jira`.
        assert_eq!(map_section_key("jiraffe_x"), "jiraffe_x");
    }
}
