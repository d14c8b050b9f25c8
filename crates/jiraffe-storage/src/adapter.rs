// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use jiraffe_config::model::StorageConfig;
use jiraffe_core::{
    AdapterType, Campus, HealthStatus, InsertOutcome, Issue, JiraffeError, PluginAdapter,
    StorageAdapter, TopicId, User,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, JiraffeError> {
        self.db.get().ok_or_else(|| JiraffeError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, JiraffeError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), JiraffeError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), JiraffeError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| JiraffeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), JiraffeError> {
        self.database()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Issue records ---

    async fn insert_issue_if_absent(&self, issue: &Issue) -> Result<InsertOutcome, JiraffeError> {
        queries::issues::insert_if_absent(self.database()?, issue).await
    }

    async fn issue_exists(&self, key: &str) -> Result<bool, JiraffeError> {
        queries::issues::exists(self.database()?, key).await
    }

    async fn set_issue_message_id(&self, key: &str, message_id: i32) -> Result<(), JiraffeError> {
        queries::issues::set_message_id(self.database()?, key, message_id).await
    }

    // --- Campuses ---

    async fn campus_topic_id(&self, campus: &str) -> Result<TopicId, JiraffeError> {
        queries::campuses::topic_id(self.database()?, campus).await
    }

    async fn campus_by_topic(&self, topic_id: TopicId) -> Result<Option<Campus>, JiraffeError> {
        queries::campuses::by_topic(self.database()?, topic_id).await
    }

    async fn list_campuses(&self) -> Result<Vec<Campus>, JiraffeError> {
        queries::campuses::list(self.database()?).await
    }

    async fn insert_campus(&self, campus: &Campus) -> Result<(), JiraffeError> {
        queries::campuses::insert(self.database()?, campus).await
    }

    // --- Users ---

    async fn list_users_in_campus(&self, topic_id: TopicId) -> Result<Vec<User>, JiraffeError> {
        queries::users::list_in_campus(self.database()?, topic_id).await
    }

    async fn insert_user(&self, user: &User) -> Result<InsertOutcome, JiraffeError> {
        queries::users::insert(self.database()?, user).await
    }

    async fn delete_user(&self, name: &str, topic_id: TopicId) -> Result<bool, JiraffeError> {
        queries::users::delete(self.database()?, name, topic_id).await
    }
}
