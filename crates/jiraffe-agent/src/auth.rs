// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator gate shared by commands and triage controls.

use jiraffe_core::types::UserId;
use jiraffe_core::{ChannelAdapter, JiraffeError};
use tracing::debug;

/// Shown to anyone who is not an administrator of the group.
pub const NOT_ADMIN_TEXT: &str = "You must be admin of the group to execute this command";

/// Checks `user` against the group's administrators.
///
/// The list is fetched on every call so that demoted admins lose access
/// immediately.
pub async fn is_admin(channel: &dyn ChannelAdapter, user: UserId) -> Result<bool, JiraffeError> {
    let admins = channel.list_administrators().await?;
    let allowed = admins.contains(&user);
    if !allowed {
        debug!(user = user.0, "rejected non-admin");
    }
    Ok(allowed)
}
