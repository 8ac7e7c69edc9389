//! mailsift — mail enrichment and idempotent delivery.
//!
//! Fetches unread messages, enriches each with structured metadata
//! (category, summary, action items, sentiment, calendar events), and
//! appends one row per message to a durable tabular store — exactly
//! once, even across restarts and partial failures.

pub mod config;
pub mod error;
pub mod ledger;
pub mod llm;
pub mod pipeline;
pub mod providers;
