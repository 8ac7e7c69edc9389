//! JSON-file mailbox.
//!
//! A local stand-in for a real mail backend: one JSON file holding an
//! array of messages with read-flags. `mark_read` rewrites the file
//! atomically, so a crash mid-write never loses the inbox.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ProviderError};
use crate::pipeline::types::Message;

use super::MailProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MailboxEntry {
    id: String,
    sender: String,
    subject: String,
    received_at: DateTime<Utc>,
    body: String,
    #[serde(default)]
    read: bool,
}

/// Mailbox backed by a single JSON file.
pub struct JsonMailbox {
    path: PathBuf,
    max_body_chars: usize,
}

impl JsonMailbox {
    /// Open an existing mailbox file. A missing file is a fatal
    /// configuration error — there is nothing to run against.
    pub fn open(path: impl Into<PathBuf>, max_body_chars: usize) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path));
        }
        Ok(Self {
            path,
            max_body_chars,
        })
    }

    fn load(&self) -> Result<Vec<MailboxEntry>, ProviderError> {
        let bytes = fs::read(&self.path)?;
        let entries = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::Mailbox(format!("malformed mailbox file: {e}")))?;
        Ok(entries)
    }

    fn store(&self, entries: &[MailboxEntry]) -> Result<(), ProviderError> {
        let tmp = temp_path(&self.path);
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl MailProvider for JsonMailbox {
    async fn list_unread(&self, limit: usize) -> Result<Vec<String>, ProviderError> {
        let ids: Vec<String> = self
            .load()?
            .into_iter()
            .filter(|e| !e.read)
            .take(limit)
            .map(|e| e.id)
            .collect();
        debug!(count = ids.len(), "listed unread messages");
        Ok(ids)
    }

    async fn fetch(&self, id: &str) -> Result<Message, ProviderError> {
        let entry = self
            .load()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        Ok(Message::new(
            entry.id,
            entry.sender,
            entry.subject,
            entry.received_at,
            entry.body,
            self.max_body_chars,
        ))
    }

    async fn mark_read(&self, id: &str) -> Result<(), ProviderError> {
        let mut entries = self.load()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        if entry.read {
            return Ok(());
        }
        entry.read = true;
        self.store(&entries)?;
        debug!(id, "marked message read");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
