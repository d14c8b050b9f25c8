// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for jiraffe.
//!
//! Layers `jiraffe.toml` files and `JIRAFFE_*` variables over compiled
//! defaults, rejects unknown keys, and reports problems through miette.
//!
//! # Usage
//!
//! ```no_run
//! use jiraffe_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Polling every {}s", config.sync.poll_interval_secs);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::JiraffeConfig;
pub use validation::parse_utc_offset;

/// Load configuration from the standard files and environment, then validate it.
pub fn load_and_validate() -> Result<JiraffeConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || read_sources(&loader::standard_paths()))
}

/// Load configuration from an explicit file (plus env vars) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<JiraffeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources(&[path.to_path_buf()])
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<JiraffeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validates a loaded config, or turns the load error into reports.
///
/// Sources are only read when there is something to point at.
fn finish(
    loaded: Result<JiraffeConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<JiraffeConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads whichever of `paths` exist, keyed the way figment names them.
fn read_sources(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            // Figment reports relative files by their absolute path.
            let path = if path.is_relative() {
                std::env::current_dir().map(|dir| dir.join(path)).unwrap_or_else(|_| path.clone())
            } else {
                path.clone()
            };
            Some((path.display().to_string(), content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_not_sources() {
        let dir = std::env::temp_dir().join("jiraffe-config-no-such-dir");
        assert!(read_sources(&[dir.join("jiraffe.toml")]).is_empty());
    }
}
