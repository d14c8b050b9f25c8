// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campus directory operations.

use jiraffe_core::{Campus, JiraffeError, TopicId};
use rusqlite::params;

use crate::database::{is_constraint_violation, Database};

/// Inserts a campus. Name and topic must both be unused.
pub async fn insert(db: &Database, campus: &Campus) -> Result<(), JiraffeError> {
    let name = campus.name.clone();
    let topic_id = campus.topic_id.0;
    let inserted = db
        .connection()
        .call(move |conn| {
            match conn.execute(
                "INSERT INTO campuses (name, topic_id) VALUES (?1, ?2)",
                params![name, topic_id],
            ) {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if !inserted {
        return Err(JiraffeError::already_exists("campus", campus.name.clone()));
    }
    Ok(())
}

/// Resolves a campus name to its topic.
pub async fn topic_id(db: &Database, name: &str) -> Result<TopicId, JiraffeError> {
    let owned = name.to_string();
    let found = db
        .connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT topic_id FROM campuses WHERE name = ?1",
                params![owned],
                |row| row.get::<_, i32>(0),
            ) {
                Ok(id) => Ok(Some(id)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    found
        .map(TopicId)
        .ok_or_else(|| JiraffeError::not_found("campus", name))
}

/// Looks up the campus bound to a topic.
pub async fn by_topic(db: &Database, topic_id: TopicId) -> Result<Option<Campus>, JiraffeError> {
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT name, topic_id FROM campuses WHERE topic_id = ?1",
                params![topic_id.0],
                |row| {
                    Ok(Campus {
                        name: row.get(0)?,
                        topic_id: TopicId(row.get(1)?),
                    })
                },
            ) {
                Ok(campus) => Ok(Some(campus)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Lists all campuses in creation order.
pub async fn list(db: &Database) -> Result<Vec<Campus>, JiraffeError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT name, topic_id FROM campuses ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(Campus {
                    name: row.get(0)?,
                    topic_id: TopicId(row.get(1)?),
                })
            })?;
            let mut campuses = Vec::new();
            for row in rows {
                campuses.push(row?);
            }
            Ok(campuses)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
