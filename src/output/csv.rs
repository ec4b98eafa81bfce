//! CSV event log for dedup and inflate runs.
//!
//! Serializes every engine event to a delimited log with one row per
//! event. Fields containing the delimiter or quote character are
//! quoted, with embedded quotes doubled (RFC 4180), which the `csv`
//! crate handles on serialization.
//!
//! # Columns
//!
//! - `file_path`: the file the event is about
//! - `action`: `scanned`, `linked`, `inflated`, `skipped`, or `error`
//! - `group_id`: duplicate/identity group id, empty when not grouped
//! - `error_message`: failure description, empty for non-error events
//!
//! # Example
//!
//! ```no_run
//! use dupelink::dedup::{deduplicate, DedupOptions};
//! use dupelink::output::EventLog;
//! use std::path::Path;
//!
//! let mut log = EventLog::create(Path::new("dedup-log.csv")).unwrap();
//! for event in deduplicate(Path::new("."), DedupOptions::default()) {
//!     log.record_dedup(&event).unwrap();
//! }
//! log.flush().unwrap();
//! ```

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::dedup::DedupEvent;
use crate::inflate::InflateEvent;

/// Errors that can occur while writing the event log.
#[derive(Debug, Error)]
pub enum CsvLogError {
    /// I/O error opening or writing the log file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single row in the event log.
#[derive(Debug, Serialize)]
struct LogRow<'a> {
    /// The file the event is about
    file_path: String,
    /// Stable lowercase action name
    action: &'a str,
    /// Group id, empty when the event is not tied to a group
    group_id: &'a str,
    /// Error message, empty for non-error events
    error_message: &'a str,
}

/// CSV writer for engine events.
pub struct EventLog<W: io::Write> {
    writer: csv::Writer<W>,
}

impl EventLog<File> {
    /// Create an event log file at the given path, truncating any
    /// existing file.
    ///
    /// # Errors
    ///
    /// Returns [`CsvLogError::Io`] if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, CsvLogError> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: io::Write> EventLog<W> {
    /// Wrap an arbitrary writer.
    #[must_use]
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Record one dedup event.
    ///
    /// # Errors
    ///
    /// Returns `CsvLogError` if serialization or writing fails.
    pub fn record_dedup(&mut self, event: &DedupEvent) -> Result<(), CsvLogError> {
        self.write_row(
            &event.path.to_string_lossy(),
            event.action.as_str(),
            event.group_id.as_deref(),
            event.error.as_deref(),
        )
    }

    /// Record one inflate event.
    ///
    /// # Errors
    ///
    /// Returns `CsvLogError` if serialization or writing fails.
    pub fn record_inflate(&mut self, event: &InflateEvent) -> Result<(), CsvLogError> {
        self.write_row(
            &event.path.to_string_lossy(),
            event.action.as_str(),
            event.group_id.as_deref(),
            event.error.as_deref(),
        )
    }

    fn write_row(
        &mut self,
        file_path: &str,
        action: &str,
        group_id: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), CsvLogError> {
        let row = LogRow {
            file_path: file_path.to_string(),
            action,
            group_id: group_id.unwrap_or(""),
            error_message: error_message.unwrap_or(""),
        };
        self.writer.serialize(row)?;
        Ok(())
    }

    /// Flush buffered rows to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvLogError` if the flush fails.
    pub fn flush(&mut self) -> Result<(), CsvLogError> {
        self.writer.flush()?;
        Ok(())
    }
}
