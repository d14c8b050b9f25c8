// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `jiraffe-core::types` for use across
//! adapter trait boundaries. This module re-exports them together with the
//! storage-only row types.

pub use jiraffe_core::types::{Campus, InsertOutcome, Issue, TopicId, User};

pub use crate::queries::issues::IssueRecord;
