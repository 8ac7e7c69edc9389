//! Runtime configuration.
//!
//! Everything is overridable through `MAILSIFT_*` environment variables;
//! defaults suit a local run out of `./data`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Settings for the probabilistic extraction path.
///
/// Absent settings mean the deterministic path runs alone.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// API key for the text model.
    pub api_key: SecretString,
    /// Model identifier (e.g. "gemini-1.5-flash").
    pub model: String,
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON mailbox file to read messages from.
    pub inbox_path: PathBuf,
    /// CSV file that receives one row per enriched message.
    pub output_path: PathBuf,
    /// Ledger file recording delivered message ids.
    pub ledger_path: PathBuf,
    /// ICS file that receives extracted calendar events.
    pub calendar_path: PathBuf,
    /// Maximum unread messages fetched per run.
    pub fetch_limit: usize,
    /// Message bodies longer than this are truncated with a marker.
    pub max_body_chars: usize,
    /// Delay between messages when the model path is live (rate limit).
    pub pacing: Duration,
    /// Ledger compaction bound: most recent N ids retained.
    pub ledger_keep: usize,
    /// Log calendar events instead of writing them.
    pub calendar_dry_run: bool,
    /// Event time used when none can be extracted.
    pub default_event_time: NaiveTime,
    /// Event duration used when none can be extracted.
    pub default_event_duration_min: i64,
    /// Probabilistic path settings; `None` disables it.
    pub llm: Option<LlmSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inbox_path: PathBuf::from("./data/inbox.json"),
            output_path: PathBuf::from("./data/enriched.csv"),
            ledger_path: PathBuf::from("./data/state.json"),
            calendar_path: PathBuf::from("./data/events.ics"),
            fetch_limit: 10,
            max_body_chars: 45_000,
            pacing: Duration::from_secs(4),
            ledger_keep: 1_000,
            calendar_dry_run: true,
            default_event_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            default_event_duration_min: 60,
            llm: None,
        }
    }
}

impl Config {
    /// Build configuration from the environment.
    ///
    /// `GEMINI_API_KEY` enables the probabilistic path; everything else
    /// falls back to defaults when unset. Malformed numeric values are
    /// a fatal configuration error, not a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MAILSIFT_INBOX") {
            config.inbox_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MAILSIFT_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MAILSIFT_LEDGER") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MAILSIFT_CALENDAR") {
            config.calendar_path = PathBuf::from(path);
        }

        if let Some(limit) = env_number("MAILSIFT_FETCH_LIMIT")? {
            config.fetch_limit = limit;
        }
        if let Some(chars) = env_number("MAILSIFT_MAX_BODY_CHARS")? {
            config.max_body_chars = chars;
        }
        if let Some(secs) = env_number("MAILSIFT_PACING_SECS")? {
            config.pacing = Duration::from_secs(secs as u64);
        }
        if let Some(keep) = env_number("MAILSIFT_LEDGER_KEEP")? {
            config.ledger_keep = keep;
        }

        if let Ok(value) = std::env::var("MAILSIFT_CALENDAR_LIVE") {
            config.calendar_dry_run = !matches!(value.as_str(), "1" | "true" | "yes");
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                let model = std::env::var("MAILSIFT_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-flash".to_string());
                config.llm = Some(LlmSettings {
                    api_key: SecretString::from(key),
                    model,
                });
            }
        }

        Ok(config)
    }
}

/// Read an optional numeric env var; present-but-malformed is an error.
fn env_number(key: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.fetch_limit, 10);
        assert_eq!(config.max_body_chars, 45_000);
        assert_eq!(config.pacing, Duration::from_secs(4));
        assert_eq!(config.ledger_keep, 1_000);
        assert!(config.calendar_dry_run);
        assert!(config.llm.is_none());
    }

    #[test]
    fn default_event_time_is_nine() {
        let config = Config::default();
        assert_eq!(
            config.default_event_time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }
}
