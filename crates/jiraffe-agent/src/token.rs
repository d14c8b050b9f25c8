// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control tokens carried by triage buttons.
//!
//! Wire layout: fields joined by `_`, the action tag last:
//! `SUP-42_begin`, `SUP-42_medium_priority`, `SUP-42_medium_alice_assign`.
//! Fields are percent-escaped (`%` -> `%25`, `_` -> `%5F`) so that values
//! may contain the delimiter.

use jiraffe_core::JiraffeError;

/// Telegram's limit on `callback_data`.
pub const MAX_TOKEN_LEN: usize = 64;

const TAG_BEGIN: &str = "begin";
const TAG_PRIORITY: &str = "priority";
const TAG_ASSIGN: &str = "assign";

/// A decoded triage step. The variant fixes which fields exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageToken {
    Begin {
        key: String,
    },
    Priority {
        key: String,
        priority: String,
    },
    Assign {
        key: String,
        priority: String,
        assignee: String,
    },
}

impl TriageToken {
    /// Issue key the token refers to.
    pub fn key(&self) -> &str {
        match self {
            TriageToken::Begin { key }
            | TriageToken::Priority { key, .. }
            | TriageToken::Assign { key, .. } => key,
        }
    }

    /// Encodes the token, failing if it would exceed [`MAX_TOKEN_LEN`] bytes.
    pub fn encode(&self) -> Result<String, JiraffeError> {
        let (fields, tag): (Vec<&str>, &str) = match self {
            TriageToken::Begin { key } => (vec![key.as_str()], TAG_BEGIN),
            TriageToken::Priority { key, priority } => {
                (vec![key.as_str(), priority.as_str()], TAG_PRIORITY)
            }
            TriageToken::Assign {
                key,
                priority,
                assignee,
            } => (
                vec![key.as_str(), priority.as_str(), assignee.as_str()],
                TAG_ASSIGN,
            ),
        };

        let mut encoded: Vec<String> = fields.into_iter().map(escape_field).collect();
        encoded.push(tag.to_string());
        let token = encoded.join("_");

        if token.len() > MAX_TOKEN_LEN {
            return Err(JiraffeError::Validation(format!(
                "control token for {} is {} bytes, limit is {MAX_TOKEN_LEN}",
                self.key(),
                token.len()
            )));
        }
        Ok(token)
    }

    /// Decodes a token received from a control activation.
    pub fn decode(token: &str) -> Result<Self, JiraffeError> {
        let parts: Vec<&str> = token.split('_').collect();
        let Some((tag, fields)) = parts.split_last() else {
            return Err(malformed(token, "empty token"));
        };
        let fields = fields
            .iter()
            .map(|f| unescape_field(f).ok_or_else(|| malformed(token, "bad escape sequence")))
            .collect::<Result<Vec<_>, _>>()?;

        if fields.iter().any(String::is_empty) {
            return Err(malformed(token, "empty field"));
        }

        let decoded = match (*tag, fields.as_slice()) {
            (TAG_BEGIN, [key]) => TriageToken::Begin { key: key.clone() },
            (TAG_PRIORITY, [key, priority]) => TriageToken::Priority {
                key: key.clone(),
                priority: priority.clone(),
            },
            (TAG_ASSIGN, [key, priority, assignee]) => TriageToken::Assign {
                key: key.clone(),
                priority: priority.clone(),
                assignee: assignee.clone(),
            },
            (TAG_BEGIN | TAG_PRIORITY | TAG_ASSIGN, _) => {
                return Err(malformed(token, "field count does not match action"));
            }
            _ => return Err(malformed(token, "unknown action")),
        };
        Ok(decoded)
    }
}

fn malformed(token: &str, reason: &str) -> JiraffeError {
    JiraffeError::InvalidToken(format!("`{token}`: {reason}"))
}

fn escape_field(field: &str) -> String {
    field.replace('%', "%25").replace('_', "%5F")
}

/// Reverses [`escape_field`]. Any `%` not starting `%25` or `%5F` is rejected.
fn unescape_field(field: &str) -> Option<String> {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos..pos + 3)?;
        match escape {
            "%25" => out.push('%'),
            "%5F" | "%5f" => out.push('_'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

/// The configured priority labels and their token form.
///
/// Tokens carry the lowercase label; decoding maps it back to the configured
/// spelling.
#[derive(Debug, Clone)]
pub struct Priorities {
    labels: Vec<String>,
}

impl Priorities {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Token value for a label.
    pub fn token_value(label: &str) -> String {
        label.to_lowercase()
    }

    /// Maps a token value back to its configured label, ignoring case.
    pub fn resolve(&self, value: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|label| label.to_lowercase() == value.to_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_plain_tokens() {
        assert_eq!(
            TriageToken::Begin {
                key: "SUP-42".into()
            }
            .encode()
            .unwrap(),
            "SUP-42_begin"
        );
        assert_eq!(
            TriageToken::Priority {
                key: "SUP-42".into(),
                priority: "medium".into()
            }
            .encode()
            .unwrap(),
            "SUP-42_medium_priority"
        );
        assert_eq!(
            TriageToken::Assign {
                key: "SUP-42".into(),
                priority: "medium".into(),
                assignee: "alice".into()
            }
            .encode()
            .unwrap(),
            "SUP-42_medium_alice_assign"
        );
    }

    #[test]
    fn escapes_underscore_in_assignee() {
        let token = TriageToken::Assign {
            key: "SUP-42".into(),
            priority: "high".into(),
            assignee: "john_doe".into(),
        };
        let encoded = token.encode().unwrap();
        assert_eq!(encoded, "SUP-42_high_john%5Fdoe_assign");
        assert_eq!(TriageToken::decode(&encoded).unwrap(), token);
    }

    #[test]
    fn decodes_legacy_shaped_tokens() {
        assert_eq!(
            TriageToken::decode("SUP-42_medium_priority").unwrap(),
            TriageToken::Priority {
                key: "SUP-42".into(),
                priority: "medium".into()
            }
        );
    }

    #[test]
    fn field_count_must_match_tag() {
        for bad in [
            "SUP-42_priority",
            "SUP-42_medium_begin",
            "SUP-42_medium_assign",
            "SUP-42_medium_alice_extra_assign",
            "begin",
        ] {
            let err = TriageToken::decode(bad).unwrap_err();
            assert!(matches!(err, JiraffeError::InvalidToken(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn rejects_unknown_tag_empty_field_and_bad_escape() {
        assert!(TriageToken::decode("SUP-42_close").is_err());
        assert!(TriageToken::decode("").is_err());
        assert!(TriageToken::decode("_begin").is_err());
        assert!(TriageToken::decode("SUP%2_begin").is_err());
        assert!(TriageToken::decode("SUP%_begin").is_err());
    }

    #[test]
    fn oversized_token_is_rejected() {
        let token = TriageToken::Assign {
            key: "SUP-123456".into(),
            priority: "medium".into(),
            assignee: "a".repeat(50),
        };
        let err = token.encode().unwrap_err();
        assert!(matches!(err, JiraffeError::Validation(_)), "got: {err}");
    }

    #[test]
    fn priorities_resolve_case_insensitively() {
        let priorities = Priorities::new(vec!["Low".into(), "Medium".into(), "High".into()]);
        assert_eq!(Priorities::token_value("Medium"), "medium");
        assert_eq!(priorities.resolve("medium"), Some("Medium"));
        assert_eq!(priorities.resolve("HIGH"), Some("High"));
        assert_eq!(priorities.resolve("urgent"), None);
    }

    proptest! {
        #[test]
        fn encoded_tokens_decode_to_themselves(
            key in "[A-Z]{1,5}-[0-9]{1,5}",
            priority in "[a-z_%]{1,8}",
            assignee in "[A-Za-z0-9._%-]{1,16}",
        ) {
            let token = TriageToken::Assign { key, priority, assignee };
            if let Ok(encoded) = token.encode() {
                prop_assert!(encoded.len() <= MAX_TOKEN_LEN);
                prop_assert_eq!(TriageToken::decode(&encoded).unwrap(), token);
            }
        }

        #[test]
        fn decode_never_panics(input in ".{0,80}") {
            let _ = TriageToken::decode(&input);
        }
    }
}
