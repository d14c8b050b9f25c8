// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for jiraffe.

use thiserror::Error;

/// The primary error type used across all jiraffe adapter traits and core operations.
#[derive(Debug, Error)]
pub enum JiraffeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat channel errors (API failure, rate limiting, inaccessible message).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Issue tracker errors (transport failure, non-success status, bad payload).
    #[error("tracker error: {message}")]
    Tracker {
        message: String,
        /// HTTP status code, when the tracker answered at all.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A keyed entity does not exist (issue, campus, user, transition).
    #[error("{kind} `{key}` not found")]
    NotFound { kind: &'static str, key: String },

    /// A keyed entity already exists and may not be created again.
    #[error("{kind} `{key}` already exists")]
    AlreadyExists { kind: &'static str, key: String },

    /// A control token could not be decoded.
    #[error("invalid control token: {0}")]
    InvalidToken(String),

    /// User supplied input failed validation (names, command arguments).
    #[error("validation error: {0}")]
    Validation(String),

    /// The acting identity is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl JiraffeError {
    /// Shorthand for a [`JiraffeError::NotFound`].
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Shorthand for a [`JiraffeError::AlreadyExists`].
    pub fn already_exists(kind: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            key: key.into(),
        }
    }

    /// Returns `true` for [`JiraffeError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
