//! CSV-file delivery store.
//!
//! Append-only: one row per enriched message, header row written once.
//! Each append is flushed to disk before reporting success — a row the
//! runner believes delivered must actually be durable, because the
//! ledger is marked right after.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProviderError;

use super::DeliveryStore;

/// Delivery store backed by a local CSV file.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeliveryStore for CsvStore {
    async fn ensure_schema(&self, columns: &[&str]) -> Result<(), ProviderError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let header = format_row(columns.iter().map(|c| c.to_string()).collect::<Vec<_>>().as_slice());
        match fs::read_to_string(&self.path) {
            Ok(existing) if !existing.trim().is_empty() => {
                if existing.lines().next() != Some(header.as_str()) {
                    warn!(
                        path = %self.path.display(),
                        "existing header differs from expected schema"
                    );
                }
                Ok(())
            }
            Ok(_) | Err(_) => {
                fs::write(&self.path, format!("{header}\n"))?;
                debug!(path = %self.path.display(), "wrote header row");
                Ok(())
            }
        }
    }

    async fn append_row(&self, values: &[String]) -> Result<(), ProviderError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_row(values))?;
        file.sync_all()?;
        Ok(())
    }
}

/// RFC 4180 row: fields containing a comma, quote, or newline are
/// quoted, with quotes doubled.
fn format_row(values: &[String]) -> String {
    values
        .iter()
        .map(|v| escape_field(v))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
