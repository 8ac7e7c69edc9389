//! Shared types for the enrichment pipeline.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Appended to a body cut at the configured cap.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Placeholder for fields with no extracted value — keeps the delivered
/// row shape constant.
pub const NONE_SENTINEL: &str = "None";

/// Canonical column order of the durable delivery store. The store has
/// no semantic field names, so this order must never change.
pub const COLUMNS: [&str; 13] = [
    "Message ID",
    "From",
    "Subject",
    "Date",
    "Category",
    "Importance",
    "Summary",
    "Content",
    "Actions",
    "Due Date",
    "Sentiment",
    "Urgency",
    "Event Created",
];

// ── Inbound message ─────────────────────────────────────────────────

/// One inbound message, immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique id from the mail provider.
    pub id: String,
    /// Sender address.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
    /// Plain-text body, truncated at the configured cap.
    pub body: String,
}

impl Message {
    /// Build a message, truncating the body at `max_body_chars` with a
    /// visible marker.
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        received_at: DateTime<Utc>,
        body: impl Into<String>,
        max_body_chars: usize,
    ) -> Self {
        let mut body = body.into();
        if body.chars().count() > max_body_chars {
            body = body.chars().take(max_body_chars).collect();
            body.push_str(TRUNCATION_MARKER);
        }
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            received_at,
            body,
        }
    }

    /// Lower-cased "subject body" haystack for the deterministic
    /// extractors.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.subject, self.body).to_lowercase()
    }

    /// First `max_chars` characters of the body (prompt budget, not
    /// storage budget). Char-boundary safe.
    pub fn body_snippet(&self, max_chars: usize) -> &str {
        match self.body.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }
}

// ── Sentiment ───────────────────────────────────────────────────────

/// Emotional tone of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Urgent,
}

impl Sentiment {
    /// Stored-string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Urgent => "urgent",
        }
    }

    /// Parse a label, case-insensitively. Unknown labels are `None` —
    /// callers default to `Neutral`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

// ── Calendar event ──────────────────────────────────────────────────

/// A calendar event extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i64,
    pub location: String,
    pub description: String,
}

impl CalendarEvent {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + chrono::Duration::minutes(self.duration_minutes)
    }
}

// ── Enrichment record ───────────────────────────────────────────────

/// Accumulated enrichment for one message. Every field is always
/// populated — extraction failure degrades to a documented default,
/// never to an unset field.
#[derive(Debug, Clone)]
pub struct EnrichmentRecord {
    pub category: String,
    pub importance: u8,
    pub summary: String,
    /// "; "-joined short action strings, or the `"None"` sentinel.
    pub actions: String,
    /// `YYYY-MM-DD`, or the `"None"` sentinel.
    pub due_date: String,
    pub sentiment: Sentiment,
    /// Clamped to [0.0, 1.0].
    pub urgency_score: f32,
    pub event: Option<CalendarEvent>,
    /// Calendar outcome: "Yes", "No", "DryRun", or "Failed".
    pub event_created: String,
}

impl EnrichmentRecord {
    /// Format the delivered row in canonical [`COLUMNS`] order. The
    /// store is text-only, so numbers are rendered here.
    pub fn to_row(&self, message: &Message) -> Vec<String> {
        vec![
            message.id.clone(),
            message.sender.clone(),
            message.subject.clone(),
            message.received_at.to_rfc3339(),
            self.category.clone(),
            self.importance.to_string(),
            self.summary.clone(),
            message.body.clone(),
            self.actions.clone(),
            self.due_date.clone(),
            self.sentiment.as_str().to_string(),
            format!("{:.2}", self.urgency_score),
            self.event_created.clone(),
        ]
    }
}
