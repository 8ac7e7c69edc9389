//! Durable record of delivered message ids.
//!
//! The ledger is the idempotency authority: an id in here has been
//! fully delivered and is never processed again, across restarts and
//! partial failures. Mutation happens in memory; durability is an
//! explicit `persist()` — write a sibling temp file, then rename over
//! the old state so a crash mid-write can never corrupt it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerState {
    /// Delivered ids, oldest first.
    processed_ids: Vec<String>,
    /// Lifetime counter — survives compaction.
    total_processed: u64,
    /// RFC 3339 timestamp of the last persist.
    last_run: Option<String>,
}

/// Crash-safe set of delivered message ids.
#[derive(Debug)]
pub struct StateLedger {
    path: PathBuf,
    state: LedgerState,
    index: HashSet<String>,
}

impl StateLedger {
    /// Load the ledger at `path`. A missing or corrupt file is an
    /// empty ledger, never a startup failure.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<LedgerState>(&bytes) {
                Ok(state) => {
                    info!(
                        path = %path.display(),
                        ids = state.processed_ids.len(),
                        "loaded ledger"
                    );
                    state
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ledger corrupt, starting empty");
                    LedgerState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ledger file, starting empty");
                LedgerState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read ledger, starting empty");
                LedgerState::default()
            }
        };

        let index = state.processed_ids.iter().cloned().collect();
        Self { path, state, index }
    }

    pub fn is_delivered(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record a delivery. Idempotent: re-marking neither duplicates the
    /// entry nor double-counts the lifetime total.
    pub fn mark_delivered(&mut self, id: &str) {
        if self.index.insert(id.to_string()) {
            self.state.processed_ids.push(id.to_string());
            self.state.total_processed += 1;
        }
    }

    /// Drop already-delivered ids, preserving input order.
    pub fn filter_undelivered(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter(|id| !self.is_delivered(id))
            .cloned()
            .collect()
    }

    /// Flush in-memory state to disk atomically. On failure the
    /// previously persisted state is untouched.
    pub fn persist(&mut self) -> Result<(), LedgerError> {
        self.state.last_run = Some(Utc::now().to_rfc3339());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = temp_path(&self.path);
        fs::write(&tmp, serde_json::to_vec_pretty(&self.state)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            ids = self.state.processed_ids.len(),
            "ledger persisted"
        );
        Ok(())
    }

    /// Retain only the most recent `keep` ids. Safe because delivered
    /// messages are also marked read upstream and never re-fetched.
    /// Returns how many were dropped.
    pub fn compact(&mut self, keep: usize) -> usize {
        let current = self.state.processed_ids.len();
        if current <= keep {
            return 0;
        }
        let removed = current - keep;
        let kept = self.state.processed_ids.split_off(removed);
        let dropped = std::mem::replace(&mut self.state.processed_ids, kept);
        for id in &dropped {
            self.index.remove(id);
        }
        info!(removed, keep, "compacted ledger");
        removed
    }

    /// Ids currently tracked.
    pub fn len(&self) -> usize {
        self.state.processed_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.processed_ids.is_empty()
    }

    /// Lifetime delivery count (not reduced by compaction).
    pub fn total_processed(&self) -> u64 {
        self.state.total_processed
    }

    /// Timestamp of the last persist, if any.
    pub fn last_run(&self) -> Option<&str> {
        self.state.last_run.as_deref()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
