// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue record operations.

use jiraffe_core::{InsertOutcome, Issue, JiraffeError};
use rusqlite::params;

use crate::database::Database;

/// Stored issue row, as read back for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub key: String,
    pub link: String,
    pub priority: String,
    pub summary: String,
    pub campus: String,
    pub created_at: String,
    pub chat_message_id: Option<i32>,
}

/// Inserts the issue unless its key is already recorded.
///
/// A single `INSERT ... ON CONFLICT DO NOTHING` so that concurrent callers
/// cannot both observe "absent".
pub async fn insert_if_absent(db: &Database, issue: &Issue) -> Result<InsertOutcome, JiraffeError> {
    let issue = issue.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO issues (key, link, priority, summary, description, reporter, assignee, campus, created_at, chat_message_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(key) DO NOTHING",
                params![
                    issue.key,
                    issue.link,
                    issue.priority,
                    issue.summary,
                    issue.description,
                    issue.reporter,
                    issue.assignee,
                    issue.campus,
                    issue.created_at.to_rfc3339(),
                    issue.chat_message_id,
                ],
            )?;
            Ok(if changed == 1 {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::AlreadyExisted
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Returns whether an issue with `key` is recorded.
pub async fn exists(db: &Database, key: &str) -> Result<bool, JiraffeError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM issues WHERE key = ?1)",
                params![key],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stores the chat message id an issue was posted as.
pub async fn set_message_id(db: &Database, key: &str, message_id: i32) -> Result<(), JiraffeError> {
    let owned_key = key.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE issues SET chat_message_id = ?1 WHERE key = ?2",
                params![message_id, owned_key],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if updated == 0 {
        return Err(JiraffeError::not_found("issue", key));
    }
    Ok(())
}

/// Reads back a stored issue.
pub async fn get(db: &Database, key: &str) -> Result<Option<IssueRecord>, JiraffeError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT key, link, priority, summary, campus, created_at, chat_message_id
                 FROM issues WHERE key = ?1",
                params![key],
                |row| {
                    Ok(IssueRecord {
                        key: row.get(0)?,
                        link: row.get(1)?,
                        priority: row.get(2)?,
                        summary: row.get(3)?,
                        campus: row.get(4)?,
                        created_at: row.get(5)?,
                        chat_message_id: row.get(6)?,
                    })
                },
            );
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Counts recorded issues.
pub async fn count(db: &Database) -> Result<i64, JiraffeError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0)))
        .await
        .map_err(crate::database::map_tr_err)
}
