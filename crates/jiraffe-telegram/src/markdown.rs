// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 rendering for Telegram Bot API.
//!
//! Telegram's MarkdownV2 parse mode requires escaping 18 special characters
//! (plus `\`) in ordinary text. Inside inline code only `` ` `` and `\` are
//! escaped, and inside a link target only `)` and `\`.

use jiraffe_core::types::{MessageBody, Segment};

/// Characters that must be escaped in MarkdownV2 ordinary text.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escapes ordinary text (also used inside bold and link labels).
pub fn escape_text(text: &str) -> String {
    escape_with(text, SPECIAL_CHARS)
}

/// Escapes the content of an inline code span.
pub fn escape_code(text: &str) -> String {
    escape_with(text, &['`', '\\'])
}

/// Escapes the target of an inline link.
pub fn escape_link_url(url: &str) -> String {
    escape_with(url, &[')', '\\'])
}

fn escape_with(text: &str, special: &[char]) -> String {
    let mut result = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if special.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Renders a [`MessageBody`] as a MarkdownV2 string.
pub fn render_body(body: &MessageBody) -> String {
    let mut out = String::new();
    for segment in &body.segments {
        match segment {
            Segment::Text(text) => out.push_str(&escape_text(text)),
            Segment::Bold(text) if text.is_empty() => {}
            Segment::Bold(text) => {
                out.push('*');
                out.push_str(&escape_text(text));
                out.push('*');
            }
            Segment::Code(text) if text.is_empty() => {}
            Segment::Code(text) => {
                out.push('`');
                out.push_str(&escape_code(text));
                out.push('`');
            }
            Segment::Link { label, url } => {
                out.push('[');
                out.push_str(&escape_text(label));
                out.push_str("](");
                out.push_str(&escape_link_url(url));
                out.push(')');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string() {
        assert_eq!(escape_text(""), "");
        assert_eq!(render_body(&MessageBody::new()), "");
    }

    #[test]
    fn plain_text_no_special_chars() {
        assert_eq!(escape_text("Hello world"), "Hello world");
    }

    #[test]
    fn escapes_all_special_characters() {
        let input = "_*[]()~`>#+-=|{}.!\\";
        let expected = "\\_\\*\\[\\]\\(\\)\\~\\`\\>\\#\\+\\-\\=\\|\\{\\}\\.\\!\\\\";
        assert_eq!(escape_text(input), expected);
    }

    #[test]
    fn issue_key_dash_is_escaped() {
        assert_eq!(escape_text("SUP-42"), "SUP\\-42");
    }

    #[test]
    fn code_escapes_only_backtick_and_backslash() {
        assert_eq!(escape_code("a.b `c` \\d_"), "a.b \\`c\\` \\\\d_");
    }

    #[test]
    fn link_url_escapes_only_paren_and_backslash() {
        assert_eq!(
            escape_link_url("https://x.org/a_(b)"),
            "https://x.org/a_(b\\)"
        );
    }

    #[test]
    fn renders_styled_segments() {
        let body = MessageBody::new()
            .link("SUP-42", "https://jira.example.com/browse/SUP-42")
            .text("\n")
            .bold("Printer on fire!")
            .text("\n")
            .code("Priority:")
            .text(" High");
        assert_eq!(
            render_body(&body),
            "[SUP\\-42](https://jira.example.com/browse/SUP-42)\n*Printer on fire\\!*\n`Priority:` High"
        );
    }

    #[test]
    fn empty_bold_and_code_are_skipped() {
        let body = MessageBody::new().bold("").code("").text("x");
        assert_eq!(render_body(&body), "x");
    }

    #[test]
    fn user_text_cannot_break_out_of_bold() {
        let body = MessageBody::new().bold("*not* bold");
        assert_eq!(render_body(&body), "*\\*not\\* bold*");
    }
}
