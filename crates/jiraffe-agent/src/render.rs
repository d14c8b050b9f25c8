// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Issue card layout.

use jiraffe_core::types::{Issue, MessageBody};

/// Timestamp layout on issue cards, e.g. `01.03.2026 10:30 GMT+03:00`.
pub const CREATED_AT_FORMAT: &str = "%d.%m.%Y %H:%M GMT%:z";

/// Telegram rejects messages longer than this.
pub const MESSAGE_LIMIT: usize = 4096;

/// Longest description kept on a card. MarkdownV2 escaping at most doubles
/// it, which leaves room for the rest of the card under [`MESSAGE_LIMIT`].
pub const MAX_DESCRIPTION_CHARS: usize = 1400;

/// Longest summary kept on a card.
pub const MAX_SUMMARY_CHARS: usize = 256;

/// Appended to a field that was cut.
pub const TRUNCATION_MARKER: &str = " [...]";

/// Renders an issue as a chat message body.
pub fn render_issue(issue: &Issue) -> MessageBody {
    MessageBody::new()
        .link(&issue.key, &issue.link)
        .text("\n\n🦒")
        .bold(truncate(&issue.summary, MAX_SUMMARY_CHARS))
        .text("\n\n🦒 ")
        .code("Description")
        .text(":\n\n")
        .text(truncate(&issue.description, MAX_DESCRIPTION_CHARS))
        .text("\n\n🦒 ")
        .code("Assignee:     ")
        .text(&issue.assignee)
        .text("\n🦒 ")
        .code("Priority:     ")
        .text(&issue.priority)
        .text("\n🦒 ")
        .code("Created at:   ")
        .text(issue.created_at.format(CREATED_AT_FORMAT).to_string())
}

/// Cuts `text` to `max` characters, marking the cut.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}{TRUNCATION_MARKER}", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use jiraffe_core::types::Segment;

    fn issue() -> Issue {
        Issue {
            key: "SUP-42".into(),
            link: "https://jira.example.com/browse/SUP-42".into(),
            priority: "Medium".into(),
            summary: "Projector in room 3 is dead".into(),
            description: "No signal on HDMI".into(),
            campus: "north-campus".into(),
            labels: vec!["north-campus".into()],
            reporter: "reporter".into(),
            assignee: "alice".into(),
            created_at: FixedOffset::east_opt(3 * 3600)
                .unwrap()
                .with_ymd_and_hms(2026, 3, 1, 10, 30, 0)
                .unwrap(),
            chat_message_id: None,
        }
    }

    #[test]
    fn card_starts_with_issue_link() {
        let body = render_issue(&issue());
        assert_eq!(
            body.segments[0],
            Segment::Link {
                label: "SUP-42".into(),
                url: "https://jira.example.com/browse/SUP-42".into()
            }
        );
        assert!(body.segments.contains(&Segment::Bold("Projector in room 3 is dead".into())));
    }

    #[test]
    fn card_lists_fields() {
        let text = render_issue(&issue()).plain_text();
        assert!(text.contains("No signal on HDMI"), "{text}");
        assert!(text.contains("Assignee:     alice"), "{text}");
        assert!(text.contains("Priority:     Medium"), "{text}");
        assert!(text.contains("Created at:   01.03.2026 10:30 GMT+03:00"), "{text}");
    }

    #[test]
    fn oversized_description_is_cut() {
        let mut issue = issue();
        // Every `.` is escaped in MarkdownV2, the worst case for length.
        issue.description = ".".repeat(5000);
        issue.summary = "!".repeat(400);

        let body = render_issue(&issue);
        let description = body
            .segments
            .iter()
            .find_map(|s| match s {
                Segment::Text(t) if t.starts_with('.') => Some(t.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            description,
            format!("{}{TRUNCATION_MARKER}", ".".repeat(MAX_DESCRIPTION_CHARS))
        );

        // Escaping at most doubles every character.
        let worst_case = body.plain_text().chars().count() * 2;
        assert!(worst_case < MESSAGE_LIMIT, "worst case {worst_case}");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("жираф", 3), format!("жир{TRUNCATION_MARKER}"));
        assert_eq!(truncate("жираф", 5), "жираф");
        assert_eq!(truncate("", 0), "");
    }
}
