//! One-line message summaries.
//!
//! The only task whose primary output is free text rather than JSON;
//! the fallback is a plain "Email from …" line built from the headers.

use crate::error::ExtractError;
use crate::pipeline::engine::ExtractStrategy;
use crate::pipeline::types::Message;

/// Stored summaries are capped for the tabular store.
const MAX_SUMMARY_CHARS: usize = 200;

/// Fallback subject excerpt cap.
const MAX_SUBJECT_CHARS: usize = 100;

const BODY_SNIPPET_CHARS: usize = 2_000;

/// Summary task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryStrategy;

impl ExtractStrategy for SummaryStrategy {
    type Output = String;

    fn task(&self) -> &'static str {
        "summary"
    }

    fn prompt(&self, message: &Message) -> String {
        format!(
            "Summarize this email in one or two short sentences. \
             Respond with the summary text only — no preamble, no labels.\n\n\
             Subject: {}\nFrom: {}\nBody:\n{}",
            message.subject,
            message.sender,
            message.body_snippet(BODY_SNIPPET_CHARS)
        )
    }

    fn parse(&self, raw: &str, _message: &Message) -> Result<String, ExtractError> {
        let summary = raw.trim();
        if summary.is_empty() {
            return Err(ExtractError::Schema("empty summary".into()));
        }
        Ok(shorten(summary, MAX_SUMMARY_CHARS))
    }

    fn fallback(&self, message: &Message) -> String {
        format!(
            "Email from {}: {}",
            message.sender,
            shorten(&message.subject, MAX_SUBJECT_CHARS)
        )
    }
}

/// Cap at `max_chars`, replacing the tail with an ellipsis when cut.
fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
