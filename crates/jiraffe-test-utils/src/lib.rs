// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for jiraffe integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Jira or Telegram.
//!
//! # Components
//!
//! - [`MockTracker`] - In-memory tracker with failing labels and captured transitions
//! - [`MockChannel`] - Mock group chat with event injection and message capture
//! - [`TestHarness`] - Relay components over temp SQLite and both mocks

pub mod harness;
pub mod mock_channel;
pub mod mock_tracker;

pub use harness::TestHarness;
pub use mock_channel::{
    MOCK_CHAT_ID, MockChannel, PostedMessage, command_event, control_activation, sender,
};
pub use mock_tracker::{AppliedTransition, MockTracker, sample_issue, start_transition};
