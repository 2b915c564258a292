/*!
Per-file outcomes and the run summary built from them.
*/

use serde::Serialize;

use crate::compression::StreamStats;

/// What happened to a single directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// No artifact existed and one was written
    Created(StreamStats),
    /// A stale artifact was rewritten
    Recreated(StreamStats),
    /// The artifact was already fresh
    UpToDate,
    /// The entry is not a candidate (an artifact, a leftover temp file or a skipped symlink)
    Skipped,
    /// The source metadata could not be read; nothing was touched
    MetadataFailed,
    /// Compression was attempted and failed
    CompressionFailed,
}

/// Summary of a whole run
///
/// Built by merging outcomes after the fact; nothing in the engine reads it
/// to make a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub directories: u64,
    pub created: u64,
    pub recreated: u64,
    pub up_to_date: u64,
    pub skipped: u64,
    pub file_failures: u64,
    pub directory_failures: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl SyncReport {
    /// Report for a single file outcome
    pub fn from_outcome(outcome: FileOutcome) -> Self {
        let mut report = Self::default();
        report.record(outcome);
        report
    }

    /// Record one file outcome
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Created(stats) => {
                self.created += 1;
                self.add_stats(stats);
            }
            FileOutcome::Recreated(stats) => {
                self.recreated += 1;
                self.add_stats(stats);
            }
            FileOutcome::UpToDate => self.up_to_date += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::MetadataFailed | FileOutcome::CompressionFailed => {
                self.file_failures += 1
            }
        }
    }

    /// Record a successfully listed directory
    pub fn record_directory(&mut self) {
        self.directories += 1;
    }

    /// Record a directory whose listing failed
    pub fn record_directory_failure(&mut self) {
        self.directory_failures += 1;
    }

    fn add_stats(&mut self, stats: StreamStats) {
        self.bytes_in += stats.bytes_in;
        self.bytes_out += stats.bytes_out;
    }

    /// Combine two partial reports
    pub fn merge(mut self, other: SyncReport) -> SyncReport {
        self.directories += other.directories;
        self.created += other.created;
        self.recreated += other.recreated;
        self.up_to_date += other.up_to_date;
        self.skipped += other.skipped;
        self.file_failures += other.file_failures;
        self.directory_failures += other.directory_failures;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self
    }

    /// Number of artifacts written
    pub fn compressions(&self) -> u64 {
        self.created + self.recreated
    }

    /// Whether any file or directory failed
    pub fn has_failures(&self) -> bool {
        self.file_failures > 0 || self.directory_failures > 0
    }

    /// JSON form of the report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} directories, {} created, {} recreated, {} up to date, {} skipped, {} failed",
            self.directories,
            self.created,
            self.recreated,
            self.up_to_date,
            self.skipped,
            self.file_failures + self.directory_failures,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(bytes_in: u64, bytes_out: u64) -> StreamStats {
        StreamStats { bytes_in, bytes_out }
    }

    #[test]
    fn test_record_outcomes() {
        let mut report = SyncReport::default();
        report.record(FileOutcome::Created(stats(100, 40)));
        report.record(FileOutcome::Recreated(stats(50, 20)));
        report.record(FileOutcome::UpToDate);
        report.record(FileOutcome::Skipped);

        assert_eq!(report.created, 1);
        assert_eq!(report.recreated, 1);
        assert_eq!(report.up_to_date, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.compressions(), 2);
        assert_eq!(report.bytes_in, 150);
        assert_eq!(report.bytes_out, 60);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_failures_are_counted() {
        let mut report = SyncReport::from_outcome(FileOutcome::MetadataFailed);
        report.record(FileOutcome::CompressionFailed);
        assert_eq!(report.file_failures, 2);
        assert!(report.has_failures());

        let mut report = SyncReport::default();
        report.record_directory_failure();
        assert!(report.has_failures());
    }

    #[test]
    fn test_merge_adds_every_counter() {
        let mut a = SyncReport::from_outcome(FileOutcome::Created(stats(10, 5)));
        a.record_directory();
        let mut b = SyncReport::from_outcome(FileOutcome::UpToDate);
        b.record_directory();
        b.record_directory_failure();

        let merged = a.merge(b);
        assert_eq!(merged.directories, 2);
        assert_eq!(merged.created, 1);
        assert_eq!(merged.up_to_date, 1);
        assert_eq!(merged.directory_failures, 1);
        assert_eq!(merged.bytes_in, 10);
    }

    #[test]
    fn test_display_and_json() {
        let report = SyncReport::from_outcome(FileOutcome::Created(stats(1, 1)));
        assert_eq!(
            report.to_string(),
            "0 directories, 1 created, 0 recreated, 0 up to date, 0 skipped, 0 failed"
        );

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["created"], 1);
        assert_eq!(json["file_failures"], 0);
    }
}
