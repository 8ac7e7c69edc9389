//! Sentiment and urgency scoring.

use serde::Deserialize;

use crate::error::ExtractError;
use crate::pipeline::engine::{extract_json_object, ExtractStrategy};
use crate::pipeline::types::{Message, Sentiment};

/// Urgency indicators. Two distinct hits make a message urgent.
pub const URGENT_KEYWORDS: [&str; 14] = [
    "urgent",
    "asap",
    "immediately",
    "emergency",
    "critical",
    "time-sensitive",
    "deadline",
    "expires",
    "last chance",
    "act now",
    "hurry",
    "quick",
    "fast",
    "important",
];

pub const NEGATIVE_KEYWORDS: [&str; 14] = [
    "problem",
    "issue",
    "error",
    "failed",
    "rejected",
    "denied",
    "declined",
    "cancelled",
    "suspended",
    "overdue",
    "late",
    "missed",
    "wrong",
    "mistake",
];

pub const POSITIVE_KEYWORDS: [&str; 12] = [
    "congratulations",
    "approved",
    "accepted",
    "selected",
    "success",
    "completed",
    "confirmed",
    "thank you",
    "great",
    "excellent",
    "wonderful",
    "pleased",
];

/// Prompt body budget.
const BODY_SNIPPET_CHARS: usize = 1_500;

/// Tone and urgency of one message. Score is always within [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentReading {
    pub sentiment: Sentiment,
    pub urgency_score: f32,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    #[serde(default)]
    sentiment: String,
    #[serde(default = "default_urgency")]
    urgency_score: f32,
}

fn default_urgency() -> f32 {
    0.5
}

/// Sentiment analysis task. Stateless: both paths read only the
/// message text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentStrategy;

impl ExtractStrategy for SentimentStrategy {
    type Output = SentimentReading;

    fn task(&self) -> &'static str {
        "sentiment"
    }

    fn prompt(&self, message: &Message) -> String {
        format!(
            "Classify the emotional tone and urgency of this email.\n\
             Respond with ONLY a JSON object:\n\
             {{\"sentiment\": \"positive|neutral|negative|urgent\", \"urgency_score\": 0.0}}\n\n\
             Rules:\n\
             - urgency_score is between 0.0 (no urgency) and 1.0 (act right now)\n\
             - \"urgent\" only when the email demands prompt action\n\n\
             Subject: {}\nFrom: {}\nBody:\n{}",
            message.subject,
            message.sender,
            message.body_snippet(BODY_SNIPPET_CHARS)
        )
    }

    fn parse(&self, raw: &str, _message: &Message) -> Result<SentimentReading, ExtractError> {
        let response: SentimentResponse = serde_json::from_str(extract_json_object(raw))?;

        // Unknown labels degrade to neutral; the score is clamped, not
        // trusted.
        let sentiment = Sentiment::parse(&response.sentiment).unwrap_or(Sentiment::Neutral);
        let urgency_score = round2(response.urgency_score.clamp(0.0, 1.0));

        Ok(SentimentReading {
            sentiment,
            urgency_score,
        })
    }

    fn fallback(&self, message: &Message) -> SentimentReading {
        let combined = message.combined_text();

        let urgent = distinct_hits(&combined, &URGENT_KEYWORDS);
        let negative = distinct_hits(&combined, &NEGATIVE_KEYWORDS);
        let positive = distinct_hits(&combined, &POSITIVE_KEYWORDS);

        let (sentiment, mut score): (Sentiment, f32) = if urgent >= 2 {
            (Sentiment::Urgent, 0.9)
        } else if negative > positive {
            (Sentiment::Negative, 0.6)
        } else if positive > negative {
            (Sentiment::Positive, 0.3)
        } else {
            (Sentiment::Neutral, 0.5)
        };

        // Exclamation and hard same-day wording push the score up.
        if message.subject.contains('!') || combined.contains("!!") {
            score = (score + 0.2).min(1.0);
        }
        if combined.contains("by today") || combined.contains("by tomorrow") {
            score = (score + 0.3).min(1.0);
        }

        SentimentReading {
            sentiment,
            urgency_score: round2(score),
        }
    }
}

/// How many of `keywords` appear at least once (distinct keywords, not
/// total occurrences).
fn distinct_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn strategy() -> SentimentStrategy {
        SentimentStrategy
    }

    fn message(subject: &str, body: &str) -> Message {
        Message::new("m-1", "a@x.com", subject, Utc::now(), body, 45_000)
    }

    #[test]
    fn two_urgent_keywords_mean_urgent() {
        let reading = strategy().fallback(&message(
            "System down",
            "This is urgent, fix it immediately.",
        ));
        assert_eq!(reading.sentiment, Sentiment::Urgent);
        assert!(reading.urgency_score >= 0.9);
    }

    #[test]
    fn one_urgent_keyword_is_not_enough() {
        let reading = strategy().fallback(&message("Note", "this is urgent but calm"));
        assert_ne!(reading.sentiment, Sentiment::Urgent);
    }

    #[test]
    fn negative_outweighs_positive() {
        let reading = strategy().fallback(&message(
            "Payment",
            "your payment failed and the account is suspended",
        ));
        assert_eq!(reading.sentiment, Sentiment::Negative);
        assert_eq!(reading.urgency_score, 0.6);
    }

    #[test]
    fn positive_outweighs_negative() {
        let reading = strategy().fallback(&message(
            "Application",
            "congratulations, your application has been approved",
        ));
        assert_eq!(reading.sentiment, Sentiment::Positive);
        assert_eq!(reading.urgency_score, 0.3);
    }

    #[test]
    fn balanced_counts_are_neutral() {
        let reading = strategy().fallback(&message("Newsletter", "weekly digest of articles"));
        assert_eq!(reading.sentiment, Sentiment::Neutral);
        assert_eq!(reading.urgency_score, 0.5);
    }

    #[test]
    fn exclamation_in_subject_bumps_score() {
        let reading = strategy().fallback(&message("Heads up!", "weekly digest of articles"));
        assert_eq!(reading.sentiment, Sentiment::Neutral);
        assert_eq!(reading.urgency_score, 0.7);
    }

    #[test]
    fn by_today_bumps_score() {
        let reading = strategy().fallback(&message("Note", "send the form by today"));
        assert_eq!(reading.urgency_score, 0.8);
    }

    #[test]
    fn bumps_clamp_at_one() {
        let reading = strategy().fallback(&message(
            "URGENT!",
            "urgent!! deadline expires, act now, reply by today",
        ));
        assert_eq!(reading.sentiment, Sentiment::Urgent);
        assert_eq!(reading.urgency_score, 1.0);
    }

    #[test]
    fn parse_valid_response() {
        let raw = r#"{"sentiment": "negative", "urgency_score": 0.62}"#;
        let reading = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(reading.sentiment, Sentiment::Negative);
        assert_eq!(reading.urgency_score, 0.62);
    }

    #[test]
    fn parse_unknown_label_degrades_to_neutral() {
        let raw = r#"{"sentiment": "enthusiastic", "urgency_score": 0.4}"#;
        let reading = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(reading.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn parse_clamps_out_of_range_score() {
        let raw = r#"{"sentiment": "urgent", "urgency_score": 7.5}"#;
        let reading = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(reading.urgency_score, 1.0);

        let raw = r#"{"sentiment": "positive", "urgency_score": -3.0}"#;
        let reading = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(reading.urgency_score, 0.0);
    }

    #[test]
    fn parse_missing_score_defaults_to_half() {
        let raw = r#"{"sentiment": "neutral"}"#;
        let reading = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(reading.urgency_score, 0.5);
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(strategy().parse("not json", &message("", "")).is_err());
    }

    #[test]
    fn parse_accepts_fenced_json() {
        let raw = "```json\n{\"sentiment\": \"urgent\", \"urgency_score\": 0.95}\n```";
        let reading = strategy().parse(raw, &message("", "")).unwrap();
        assert_eq!(reading.sentiment, Sentiment::Urgent);
    }
}
