//! Error types for mailsift.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration/startup errors. These are fatal: nothing is processed
/// after one of these surfaces.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ledger persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from external collaborators (mail source, tabular sink,
/// calendar). Caught at the call site and never allowed to cross the
/// per-message boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("Delivery store error: {0}")]
    Store(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Probabilistic model errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Rejected model output. Always triggers the deterministic fallback,
/// never propagates.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema violation: {0}")]
    Schema(String),
}

/// Per-run pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Result type alias for mailsift.
pub type Result<T> = std::result::Result<T, Error>;
