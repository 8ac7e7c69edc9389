//! Two-path extraction: probabilistic primary, deterministic fallback.
//!
//! Each task implements [`ExtractStrategy`]; the engine owns the model
//! handle (decided once at construction) and guarantees the fallback
//! contract: any model error or rejected output degrades to the
//! deterministic path, with the same output shape, never an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::llm::TextModel;
use crate::pipeline::types::Message;

/// One extraction task with two interchangeable paths.
pub trait ExtractStrategy {
    /// Task-specific result shape. Both paths produce it.
    type Output;

    /// Task label for logs.
    fn task(&self) -> &'static str;

    /// Prompt for the probabilistic path.
    fn prompt(&self, message: &Message) -> String;

    /// Strict parse of raw model output. Fails closed: anything that
    /// does not validate becomes an `ExtractError`, never a guess.
    fn parse(&self, raw: &str, message: &Message) -> Result<Self::Output, ExtractError>;

    /// Deterministic path. Total — cannot fail.
    fn fallback(&self, message: &Message) -> Self::Output;
}

/// Runs strategies through the model when one is configured, falling
/// back to the deterministic path otherwise.
pub struct ExtractionEngine {
    model: Option<Arc<dyn TextModel>>,
}

impl ExtractionEngine {
    /// The capability check happens here, once: a `None` model means
    /// every `run` goes straight to the fallback.
    pub fn new(model: Option<Arc<dyn TextModel>>) -> Self {
        Self { model }
    }

    /// Whether the probabilistic path is live (drives pacing).
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Execute one task against one message.
    pub async fn run<S: ExtractStrategy>(&self, strategy: &S, message: &Message) -> S::Output {
        if let Some(model) = &self.model {
            match model.generate(&strategy.prompt(message)).await {
                Ok(raw) => match strategy.parse(&raw, message) {
                    Ok(output) => return output,
                    Err(e) => {
                        warn!(
                            task = strategy.task(),
                            id = %message.id,
                            error = %e,
                            "model output rejected, using fallback"
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        task = strategy.task(),
                        id = %message.id,
                        error = %e,
                        "model call failed, using fallback"
                    );
                }
            }
        } else {
            debug!(task = strategy.task(), "no model configured, using fallback");
        }
        strategy.fallback(message)
    }
}

/// Pull the JSON object out of raw model output: strips a markdown
/// code fence when present, otherwise takes the outermost `{...}`.
pub fn extract_json_object(raw: &str) -> &str {
    let trimmed = raw.trim();

    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let after = &trimmed[start + fence.len()..];
            if let Some(end) = after.find("```") {
                let inner = after[..end].trim();
                if inner.starts_with('{') {
                    return inner;
                }
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Truncate to `max_chars` characters on a char boundary.
pub fn cap_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect()
    } else {
        text.to_string()
    }
}
