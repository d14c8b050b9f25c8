// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for jiraffe.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! background connection via `tokio-rusqlite`, and typed operations for
//! issue records, campuses and users. Dedup of issue records is decided by
//! the schema's `UNIQUE(key)` constraint.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use models::*;
