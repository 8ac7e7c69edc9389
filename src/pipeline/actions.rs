//! Action item and deadline extraction.

use serde::Deserialize;

use crate::error::ExtractError;
use crate::pipeline::dates::DateResolver;
use crate::pipeline::engine::{cap_chars, extract_json_object, ExtractStrategy};
use crate::pipeline::types::{Message, NONE_SENTINEL};

/// A sentence mentioning one of these reads as actionable.
pub const ACTION_KEYWORDS: [&str; 22] = [
    "please",
    "kindly",
    "required",
    "must",
    "need to",
    "submit",
    "complete",
    "register",
    "confirm",
    "reply",
    "respond",
    "review",
    "sign",
    "attend",
    "apply",
    "pay",
    "renew",
    "update",
    "schedule",
    "rsvp",
    "deadline",
    "due",
];

/// Candidate sentences outside this window are noise (fragments) or
/// run-ons, not actions.
const MIN_SENTENCE_CHARS: usize = 10;
const MAX_SENTENCE_CHARS: usize = 200;

/// At most this many actions per message.
const MAX_ACTIONS: usize = 3;

/// Joined action text is capped for the tabular store.
const MAX_ACTIONS_CHARS: usize = 500;

/// Prompt body budget (model context, not storage).
const BODY_SNIPPET_CHARS: usize = 2_000;

/// Extracted actions for one message. Both fields always populated —
/// `"None"` when nothing was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItems {
    pub actions: String,
    pub due_date: String,
}

impl ActionItems {
    pub fn none() -> Self {
        Self {
            actions: NONE_SENTINEL.to_string(),
            due_date: NONE_SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    deadlines: Vec<String>,
}

/// Action/deadline extraction task.
#[derive(Debug, Clone)]
pub struct ActionStrategy {
    resolver: DateResolver,
}

impl ActionStrategy {
    pub fn new(resolver: DateResolver) -> Self {
        Self { resolver }
    }
}

impl ExtractStrategy for ActionStrategy {
    type Output = ActionItems;

    fn task(&self) -> &'static str {
        "actions"
    }

    fn prompt(&self, message: &Message) -> String {
        format!(
            "Extract actionable tasks and deadlines from this email.\n\
             Respond with ONLY a JSON object:\n\
             {{\"actions\": [\"short imperative task\", ...], \"deadlines\": [\"YYYY-MM-DD\", ...]}}\n\n\
             Rules:\n\
             - At most 3 actions, each under 15 words\n\
             - Deadlines only when the email states one; omit guesses\n\
             - Empty lists when there is nothing actionable\n\n\
             Subject: {}\nBody:\n{}",
            message.subject,
            message.body_snippet(BODY_SNIPPET_CHARS)
        )
    }

    fn parse(&self, raw: &str, _message: &Message) -> Result<ActionItems, ExtractError> {
        let response: ActionResponse = serde_json::from_str(extract_json_object(raw))?;

        let actions = if response.actions.is_empty() {
            NONE_SENTINEL.to_string()
        } else {
            cap_chars(&response.actions.join("; "), MAX_ACTIONS_CHARS)
        };

        // Only a well-formed date is worth storing; anything else
        // degrades this field alone, not the whole parse.
        let due_date = response
            .deadlines
            .iter()
            .find(|d| chrono::NaiveDate::parse_from_str(d.as_str(), "%Y-%m-%d").is_ok())
            .cloned()
            .unwrap_or_else(|| NONE_SENTINEL.to_string());

        Ok(ActionItems { actions, due_date })
    }

    fn fallback(&self, message: &Message) -> ActionItems {
        let combined = message.combined_text();

        let mut actions: Vec<String> = Vec::new();
        for sentence in combined.split(['.', '!', '?']) {
            let cleaned = sentence.trim();
            let chars = cleaned.chars().count();
            if chars <= MIN_SENTENCE_CHARS || chars >= MAX_SENTENCE_CHARS {
                continue;
            }
            if ACTION_KEYWORDS.iter().any(|k| cleaned.contains(k)) {
                actions.push(capitalize(cleaned));
                if actions.len() == MAX_ACTIONS {
                    break;
                }
            }
        }

        let actions = if actions.is_empty() {
            NONE_SENTINEL.to_string()
        } else {
            cap_chars(&actions.join("; "), MAX_ACTIONS_CHARS)
        };

        // The deadline scan runs over the whole combined text,
        // independent of which sentences were kept.
        let due_date = self
            .resolver
            .resolve(&combined)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NONE_SENTINEL.to_string());

        ActionItems { actions, due_date }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn strategy() -> ActionStrategy {
        // Monday.
        ActionStrategy::new(DateResolver::with_today(
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
        ))
    }

    fn message(subject: &str, body: &str) -> Message {
        Message::new("m-1", "a@x.com", subject, Utc::now(), body, 45_000)
    }

    #[test]
    fn fallback_finds_action_sentence() {
        let result = strategy().fallback(&message(
            "Assignment",
            "Hi. Please submit your final assignment by Friday. Thanks.",
        ));
        assert!(result.actions.starts_with("Please submit"));
        assert_eq!(result.due_date, "2026-01-30");
    }

    #[test]
    fn fallback_caps_at_three_actions() {
        let body = "Please do the first thing. Please do the second thing. \
                    Please do the third thing. Please do the fourth thing.";
        let result = strategy().fallback(&message("Tasks", body));
        assert_eq!(result.actions.matches("; ").count(), 2);
    }

    #[test]
    fn fallback_skips_short_and_long_sentences() {
        let long = format!("please {}", "x".repeat(250));
        let body = format!("please ok. {long}. Nothing else here at all.");
        let result = strategy().fallback(&message("", &body));
        assert_eq!(result.actions, NONE_SENTINEL);
    }

    #[test]
    fn fallback_without_actions_is_none_sentinel() {
        let result = strategy().fallback(&message("Hello", "Just wanted to say hi there friend."));
        assert_eq!(result.actions, NONE_SENTINEL);
        assert_eq!(result.due_date, NONE_SENTINEL);
    }

    #[test]
    fn fallback_deadline_independent_of_actions() {
        // No action keyword anywhere, but a date is present.
        let result = strategy().fallback(&message("FYI", "The office closes 02/05/2026 for maintenance"));
        assert_eq!(result.actions, NONE_SENTINEL);
        assert_eq!(result.due_date, "2026-02-05");
    }

    #[test]
    fn fallback_capitalizes_actions() {
        let result = strategy().fallback(&message("", "you should reply to the vendor today."));
        assert!(result.actions.starts_with("You should reply"));
    }

    #[test]
    fn parse_joins_and_picks_first_valid_deadline() {
        let raw = r#"{"actions": ["Submit report", "Book room"], "deadlines": ["soon", "2026-02-05"]}"#;
        let result = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(result.actions, "Submit report; Book room");
        assert_eq!(result.due_date, "2026-02-05");
    }

    #[test]
    fn parse_empty_lists_become_sentinels() {
        let raw = r#"{"actions": [], "deadlines": []}"#;
        let result = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(result, ActionItems::none());
    }

    #[test]
    fn parse_accepts_fenced_json() {
        let raw = "```json\n{\"actions\": [\"Reply to Alice\"], \"deadlines\": []}\n```";
        let result = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(result.actions, "Reply to Alice");
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(strategy().parse("not json at all", &message("", "")).is_err());
    }

    #[test]
    fn parse_caps_joined_length() {
        let raw = format!(
            r#"{{"actions": ["{}", "{}"], "deadlines": []}}"#,
            "a".repeat(400),
            "b".repeat(400)
        );
        let result = strategy().parse(&raw, &message("", "")).unwrap();
        assert_eq!(result.actions.chars().count(), 500);
    }

    #[test]
    fn prompt_includes_subject_and_body() {
        let prompt = strategy().prompt(&message("Renewal notice", "renew by friday"));
        assert!(prompt.contains("Renewal notice"));
        assert!(prompt.contains("renew by friday"));
    }
}
