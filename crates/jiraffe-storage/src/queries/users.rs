// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignee directory operations.

use jiraffe_core::{InsertOutcome, JiraffeError, TopicId, User};
use rusqlite::params;

use crate::database::Database;

/// Registers a user in a campus unless the name is taken there.
pub async fn insert(db: &Database, user: &User) -> Result<InsertOutcome, JiraffeError> {
    let name = user.name.clone();
    let topic_id = user.campus_topic_id.0;
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO users (name, campus_topic_id) VALUES (?1, ?2)
                 ON CONFLICT(name, campus_topic_id) DO NOTHING",
                params![name, topic_id],
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

/// Lists users of one campus, ordered by name.
pub async fn list_in_campus(db: &Database, topic_id: TopicId) -> Result<Vec<User>, JiraffeError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT name, campus_topic_id FROM users WHERE campus_topic_id = ?1
                 ORDER BY name COLLATE NOCASE",
            )?;
            let rows = stmt.query_map(params![topic_id.0], |row| {
                Ok(User {
                    name: row.get(0)?,
                    campus_topic_id: TopicId(row.get(1)?),
                })
            })?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Removes a user from a campus. Returns `false` if no such registration existed.
pub async fn delete(db: &Database, name: &str, topic_id: TopicId) -> Result<bool, JiraffeError> {
    let name = name.to_string();
    let deleted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM users WHERE name = ?1 AND campus_topic_id = ?2",
                params![name, topic_id.0],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(deleted > 0)
}
