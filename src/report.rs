//! Event-stream consumers: counting, savings, and the final summary.
//!
//! The engines report nothing but events; these reports fold an event
//! stream into counters and the byte totals used for savings/restore
//! reporting, and print the human-facing summary at the end of a run.

use std::fs;
use std::path::Path;

use bytesize::ByteSize;
use yansi::Paint;

use crate::dedup::{DedupAction, DedupEvent};
use crate::inflate::{InflateAction, InflateEvent};

/// Folded results of a dedup event stream.
#[derive(Debug, Default, Clone)]
pub struct DedupReport {
    /// Number of `Scanned` events.
    pub scanned: usize,
    /// Number of `Linked` events.
    pub linked: usize,
    /// Number of `Skipped` events.
    pub skipped: usize,
    /// Number of `Error` events.
    pub errors: usize,
    /// Bytes of shared storage gained by linking.
    pub bytes_saved: u64,
}

impl DedupReport {
    /// Fold one event into the report.
    pub fn record(&mut self, event: &DedupEvent) {
        match event.action {
            DedupAction::Scanned => self.scanned += 1,
            DedupAction::Linked => {
                self.linked += 1;
                self.bytes_saved += file_size(&event.path);
            }
            DedupAction::Skipped => self.skipped += 1,
            DedupAction::Error => self.errors += 1,
        }
    }

    /// True when the stream ended on a fatal preflight error: nothing
    /// was scanned and at least one error was reported.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.errors > 0 && self.scanned == 0 && self.linked == 0 && self.skipped == 0
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self) {
        println!(
            "{} {} scanned, {} linked, {} skipped, {} error(s)",
            "Dedup complete:".bold(),
            self.scanned,
            self.linked,
            self.skipped,
            self.errors
        );
        if self.linked > 0 {
            println!(
                "Reclaimed {} of duplicate storage",
                ByteSize(self.bytes_saved).to_string().green()
            );
        }
    }
}

/// Folded results of an inflate event stream.
#[derive(Debug, Default, Clone)]
pub struct InflateReport {
    /// Number of `Scanned` events.
    pub scanned: usize,
    /// Number of `Inflated` events.
    pub inflated: usize,
    /// Number of `Skipped` events.
    pub skipped: usize,
    /// Number of `Error` events.
    pub errors: usize,
    /// Bytes written back out as independent copies.
    pub bytes_restored: u64,
}

impl InflateReport {
    /// Fold one event into the report.
    pub fn record(&mut self, event: &InflateEvent) {
        match event.action {
            InflateAction::Scanned => self.scanned += 1,
            InflateAction::Inflated => {
                self.inflated += 1;
                self.bytes_restored += file_size(&event.path);
            }
            InflateAction::Skipped => self.skipped += 1,
            InflateAction::Error => self.errors += 1,
        }
    }

    /// True when the stream ended on a fatal preflight error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.errors > 0 && self.scanned == 0 && self.inflated == 0 && self.skipped == 0
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self) {
        println!(
            "{} {} scanned, {} inflated, {} skipped, {} error(s)",
            "Inflate complete:".bold(),
            self.scanned,
            self.inflated,
            self.skipped,
            self.errors
        );
        if self.inflated > 0 {
            println!(
                "Restored {} as independent copies",
                ByteSize(self.bytes_restored).to_string().green()
            );
        }
    }
}

/// Print one error event to stderr.
pub fn print_error(path: &Path, message: &str) {
    eprintln!("{} {}: {}", "error:".red().bold(), path.display(), message);
}

/// Size of a file, zero when it cannot be queried.
fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dedup_event(action: DedupAction) -> DedupEvent {
        DedupEvent {
            path: PathBuf::from("/nonexistent/file.txt"),
            action,
            group_id: None,
            error: None,
        }
    }

    fn inflate_event(action: InflateAction) -> InflateEvent {
        InflateEvent {
            path: PathBuf::from("/nonexistent/file.txt"),
            action,
            group_id: None,
            error: None,
        }
    }

    #[test]
    fn test_dedup_report_counts() {
        let mut report = DedupReport::default();
        report.record(&dedup_event(DedupAction::Scanned));
        report.record(&dedup_event(DedupAction::Scanned));
        report.record(&dedup_event(DedupAction::Linked));
        report.record(&dedup_event(DedupAction::Skipped));
        report.record(&dedup_event(DedupAction::Error));

        assert_eq!(report.scanned, 2);
        assert_eq!(report.linked, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors, 1);
        assert!(!report.is_fatal());
    }

    #[test]
    fn test_dedup_fatal_detection() {
        let mut report = DedupReport::default();
        report.record(&dedup_event(DedupAction::Error));
        assert!(report.is_fatal());

        report.record(&dedup_event(DedupAction::Scanned));
        assert!(!report.is_fatal());
    }

    #[test]
    fn test_inflate_report_counts() {
        let mut report = InflateReport::default();
        report.record(&inflate_event(InflateAction::Scanned));
        report.record(&inflate_event(InflateAction::Inflated));

        assert_eq!(report.scanned, 1);
        assert_eq!(report.inflated, 1);
        assert!(!report.is_fatal());
    }

    #[test]
    fn test_bytes_saved_tracks_linked_file_sizes() {
        use std::io::Write;
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("linked.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"0123456789")
            .unwrap();

        let mut report = DedupReport::default();
        report.record(&DedupEvent {
            path,
            action: DedupAction::Linked,
            group_id: Some("1".to_string()),
            error: None,
        });
        assert_eq!(report.bytes_saved, 10);
    }
}
