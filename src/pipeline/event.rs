//! Calendar event detection and extraction.
//!
//! Detection gates on the raw text alone; extraction then needs a
//! resolvable date. A message without one simply has no event — that
//! is absence, not an error.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::error::ExtractError;
use crate::pipeline::dates::DateResolver;
use crate::pipeline::engine::{cap_chars, extract_json_object, ExtractStrategy};
use crate::pipeline::types::{CalendarEvent, Message};

/// Keyword groups that indicate a schedulable event, with the label
/// used to prefix the event title.
const EVENT_KEYWORDS: [(&str, &[&str]); 5] = [
    ("Interview", &["interview"]),
    ("Meeting", &["meeting", "standup", "sync-up"]),
    ("Call", &["phone call", "video call", "conference call", "call scheduled"]),
    ("Appointment", &["appointment"]),
    ("Webinar", &["webinar", "workshop", "seminar"]),
];

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 500;
const BODY_SNIPPET_CHARS: usize = 2_000;

#[derive(Debug, Deserialize)]
struct EventResponse {
    #[serde(default)]
    has_event: bool,
    #[serde(default)]
    event_title: Option<String>,
    #[serde(default)]
    event_date: Option<String>,
    #[serde(default)]
    event_time: Option<String>,
    #[serde(default)]
    duration_minutes: Option<i64>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Calendar-event extraction task.
#[derive(Debug, Clone)]
pub struct EventStrategy {
    resolver: DateResolver,
    default_time: NaiveTime,
    default_duration_min: i64,
}

impl EventStrategy {
    pub fn new(resolver: DateResolver, default_time: NaiveTime, default_duration_min: i64) -> Self {
        Self {
            resolver,
            default_time,
            default_duration_min,
        }
    }

    /// Whether the message looks like it carries an event at all.
    /// Checked before any extraction path runs.
    pub fn detect(&self, message: &Message) -> bool {
        let combined = message.combined_text();
        EVENT_KEYWORDS
            .iter()
            .any(|(_, keywords)| keywords.iter().any(|k| combined.contains(k)))
    }

    /// Title prefix for the first matching keyword group, if any.
    fn event_label(combined: &str) -> Option<&'static str> {
        EVENT_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| combined.contains(k)))
            .map(|(label, _)| *label)
    }
}

impl ExtractStrategy for EventStrategy {
    type Output = Option<CalendarEvent>;

    fn task(&self) -> &'static str {
        "event"
    }

    fn prompt(&self, message: &Message) -> String {
        format!(
            "Decide whether this email describes a schedulable event \
             (interview, meeting, call, appointment, webinar).\n\
             Respond with ONLY a JSON object:\n\
             {{\"has_event\": false}}\n\
             or\n\
             {{\"has_event\": true, \"event_title\": \"...\", \"event_date\": \"YYYY-MM-DD\", \
             \"event_time\": \"HH:MM\", \"duration_minutes\": 60, \
             \"location\": \"...\", \"description\": \"...\"}}\n\n\
             Rules:\n\
             - has_event is true only for a concrete, dated occasion\n\
             - Omit fields you cannot determine\n\n\
             Subject: {}\nBody:\n{}",
            message.subject,
            message.body_snippet(BODY_SNIPPET_CHARS)
        )
    }

    fn parse(&self, raw: &str, message: &Message) -> Result<Option<CalendarEvent>, ExtractError> {
        let response: EventResponse = serde_json::from_str(extract_json_object(raw))?;

        if !response.has_event {
            return Ok(None);
        }

        // A claimed event without a well-formed date is not usable;
        // fail closed so the deterministic path decides.
        let date = response
            .event_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| ExtractError::Schema("has_event without a valid event_date".into()))?;

        let time = response
            .event_time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
            .unwrap_or(self.default_time);

        let title = response
            .event_title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| message.subject.clone());

        Ok(Some(CalendarEvent {
            title: cap_chars(&title, MAX_TITLE_CHARS),
            date,
            time,
            duration_minutes: response
                .duration_minutes
                .filter(|&d| d > 0)
                .unwrap_or(self.default_duration_min),
            location: response.location.unwrap_or_else(|| "Online".to_string()),
            description: response
                .description
                .unwrap_or_else(|| message.body_snippet(MAX_DESCRIPTION_CHARS).to_string()),
        }))
    }

    fn fallback(&self, message: &Message) -> Option<CalendarEvent> {
        let combined = message.combined_text();

        let date = self.resolver.resolve(&combined)?;
        let time = self
            .resolver
            .resolve_time(&combined)
            .unwrap_or(self.default_time);

        let title = match Self::event_label(&combined) {
            Some(label) => format!("{label}: {}", message.subject),
            None => message.subject.clone(),
        };

        let location = if ["zoom", "teams", "meet.google", "google meet"]
            .iter()
            .any(|k| combined.contains(k))
        {
            "Online".to_string()
        } else {
            "TBD".to_string()
        };

        Some(CalendarEvent {
            title: cap_chars(&title, MAX_TITLE_CHARS),
            date,
            time,
            duration_minutes: self.default_duration_min,
            location,
            description: message.body_snippet(MAX_DESCRIPTION_CHARS).to_string(),
        })
    }
}
