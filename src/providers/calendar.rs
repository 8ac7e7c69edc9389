//! ICS-file calendar provider.
//!
//! Writes extracted events into a local iCalendar file. Dry-run mode
//! (the default) only logs what would be created and reports the
//! literal "DryRun", mirroring a real provider left unconfigured.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::ProviderError;
use crate::pipeline::types::CalendarEvent;

use super::CalendarProvider;

const CALENDAR_HEADER: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//mailsift//EN\r\n";
const CALENDAR_FOOTER: &str = "END:VCALENDAR\r\n";

/// Calendar sink backed by a local .ics file.
pub struct IcsCalendar {
    path: PathBuf,
    dry_run: bool,
}

impl IcsCalendar {
    pub fn new(path: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            path: path.into(),
            dry_run,
        }
    }
}

#[async_trait]
impl CalendarProvider for IcsCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, ProviderError> {
        if self.dry_run {
            info!(
                title = %event.title,
                date = %event.date,
                time = %event.time,
                "dry run: would create calendar event"
            );
            return Ok("DryRun".to_string());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Insert before the calendar footer; rewrite atomically.
        let existing = match fs::read_to_string(&self.path) {
            Ok(contents) if contents.contains(CALENDAR_FOOTER) => contents,
            _ => format!("{CALENDAR_HEADER}{CALENDAR_FOOTER}"),
        };
        let updated = existing.replacen(
            CALENDAR_FOOTER,
            &format!("{}{CALENDAR_FOOTER}", format_vevent(event)),
            1,
        );

        let tmp = temp_path(&self.path);
        fs::write(&tmp, updated)?;
        fs::rename(&tmp, &self.path)?;

        info!(title = %event.title, date = %event.date, "calendar event written");
        Ok(format!("file://{}", self.path.display()))
    }
}

fn format_vevent(event: &CalendarEvent) -> String {
    format!(
        "BEGIN:VEVENT\r\nSUMMARY:{}\r\nDTSTART:{}\r\nDTEND:{}\r\nLOCATION:{}\r\nDESCRIPTION:{}\r\nEND:VEVENT\r\n",
        escape_text(&event.title),
        event.starts_at().format("%Y%m%dT%H%M%S"),
        event.ends_at().format("%Y%m%dT%H%M%S"),
        escape_text(&event.location),
        escape_text(&event.description),
    )
}

/// iCalendar TEXT escaping: backslash, comma, semicolon, newline.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
        .replace('\r', "")
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
