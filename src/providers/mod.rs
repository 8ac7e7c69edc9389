//! External collaborator interfaces — pure I/O, no business logic.
//!
//! The pipeline core depends on these capability traits, not on any
//! concrete backend. Each call may fail independently; the runner
//! decides what a failure degrades to.

pub mod calendar;
pub mod mailbox;
pub mod sheet;

pub use calendar::IcsCalendar;
pub use mailbox::JsonMailbox;
pub use sheet::CsvStore;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::pipeline::types::{CalendarEvent, Message};

/// Source of inbound messages.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Ids of unread messages, at most `limit`.
    async fn list_unread(&self, limit: usize) -> Result<Vec<String>, ProviderError>;

    /// Fetch one message by id.
    async fn fetch(&self, id: &str) -> Result<Message, ProviderError>;

    /// Mark a message read so it is not fetched again.
    async fn mark_read(&self, id: &str) -> Result<(), ProviderError>;
}

/// Append-only tabular sink. Text-only: the core formats numbers and
/// keeps the column order stable; the store knows nothing about fields.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Make sure the schema (header row) exists.
    async fn ensure_schema(&self, columns: &[&str]) -> Result<(), ProviderError>;

    /// Append one row in canonical column order.
    async fn append_row(&self, values: &[String]) -> Result<(), ProviderError>;
}

/// Calendar sink for extracted events. Optional collaborator.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Create an event; returns a link, or the literal "DryRun" when
    /// the provider is configured not to write.
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, ProviderError>;
}
