// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::JiraffeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Campus, InsertOutcome, Issue, TopicId, User};

/// Adapter for storage and persistence backends.
///
/// Holds the record of already-notified issues together with the campus and
/// user directories used for routing and assignment.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), JiraffeError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), JiraffeError>;

    // --- Issue records ---

    /// Inserts the issue unless a record with the same key exists.
    ///
    /// This is the only dedup guard: the decision is made by the backend's
    /// uniqueness constraint in a single statement.
    async fn insert_issue_if_absent(&self, issue: &Issue) -> Result<InsertOutcome, JiraffeError>;

    /// Returns whether a record for `key` exists.
    async fn issue_exists(&self, key: &str) -> Result<bool, JiraffeError>;

    /// Records the chat message an issue was posted as.
    async fn set_issue_message_id(&self, key: &str, message_id: i32) -> Result<(), JiraffeError>;

    // --- Campuses ---

    /// Resolves a campus name to its topic. Unknown names yield [`JiraffeError::NotFound`].
    async fn campus_topic_id(&self, campus: &str) -> Result<TopicId, JiraffeError>;

    /// Looks up the campus bound to a topic.
    async fn campus_by_topic(&self, topic_id: TopicId) -> Result<Option<Campus>, JiraffeError>;

    /// Lists campuses ordered by creation.
    async fn list_campuses(&self) -> Result<Vec<Campus>, JiraffeError>;

    /// Inserts a campus. A duplicate name or topic yields [`JiraffeError::AlreadyExists`].
    async fn insert_campus(&self, campus: &Campus) -> Result<(), JiraffeError>;

    // --- Users ---

    /// Lists the users registered in a campus, ordered by name.
    async fn list_users_in_campus(&self, topic_id: TopicId) -> Result<Vec<User>, JiraffeError>;

    /// Registers a user unless the name is already taken in that campus.
    async fn insert_user(&self, user: &User) -> Result<InsertOutcome, JiraffeError>;

    /// Removes a user from a campus. Returns `false` if nothing was deleted.
    async fn delete_user(&self, name: &str, topic_id: TopicId) -> Result<bool, JiraffeError>;
}
