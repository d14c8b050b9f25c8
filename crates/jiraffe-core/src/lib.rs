// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for jiraffe.
//!
//! This crate provides the error type, the domain types (issues, campuses,
//! users, chat events) and the adapter traits that the tracker, storage and
//! chat adapters implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::JiraffeError;
pub use types::{
    AdapterType, Campus, ChatEvent, ChatId, HealthStatus, InsertOutcome, Issue, TopicId,
    Transition, User, UserId,
};

pub use traits::{ChannelAdapter, PluginAdapter, StorageAdapter, TrackerAdapter};
