//! Probabilistic text model integration.
//!
//! The pipeline treats the model as an opaque, fallible function from
//! prompt text to response text. Whether a model exists at all is
//! decided once, here, at construction — never re-checked per call.

mod gemini;

pub use gemini::GeminiModel;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmSettings;
use crate::error::LlmError;

/// Opaque text model: prompt in, text out, may fail.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier for logs.
    fn model_name(&self) -> &str;

    /// Generate a response. No contract on output format — callers
    /// must parse defensively.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Build the model handle from configuration. `None` settings mean the
/// deterministic extraction path runs alone.
pub fn create_model(settings: Option<&LlmSettings>) -> Option<Arc<dyn TextModel>> {
    match settings {
        Some(settings) => {
            tracing::info!(model = %settings.model, "probabilistic extraction enabled");
            Some(Arc::new(GeminiModel::new(settings.clone())))
        }
        None => {
            tracing::info!("no model configured, deterministic extraction only");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn create_model_without_settings_is_none() {
        assert!(create_model(None).is_none());
    }

    #[test]
    fn create_model_with_settings_constructs() {
        // Any key constructs a client; auth fails at request time.
        let settings = LlmSettings {
            api_key: SecretString::from("test-key"),
            model: "gemini-1.5-flash".to_string(),
        };
        let model = create_model(Some(&settings)).unwrap();
        assert_eq!(model.model_name(), "gemini-1.5-flash");
    }
}
