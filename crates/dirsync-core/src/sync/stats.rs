//! Per-run counters

use serde::Serialize;

use crate::mirror::MirrorOutcome;
use crate::reconcile::ReconcileOutcome;
use crate::scan::ScanResult;

/// Counters for one job's run. Reset at the start of every job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatistics {
    pub dirs_scanned: u64,
    pub dirs_changed: u64,
    pub files_synced: u64,
    pub files_deleted: u64,
    pub dirs_deleted: u64,
    pub bytes_synced: u64,
    pub errors: u64,
    /// Wall-clock duration of the run
    pub elapsed_ms: u64,
}

impl SyncStatistics {
    pub fn absorb_scan(&mut self, scan: &ScanResult) {
        self.dirs_scanned += scan.scanned;
        self.dirs_changed += scan.changed.len() as u64;
        self.errors += scan.errors;
    }

    pub fn absorb_mirror(&mut self, outcome: &MirrorOutcome) {
        self.files_synced += outcome.files_copied;
        self.bytes_synced += outcome.bytes_copied;
        self.errors += outcome.errors;
    }

    pub fn absorb_reconcile(&mut self, outcome: &ReconcileOutcome) {
        self.files_deleted += outcome.files_deleted;
        self.dirs_deleted += outcome.dirs_deleted;
        self.errors += outcome.errors;
    }

    /// One error that no component outcome accounts for.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }
}

impl std::fmt::Display for SyncStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} scanned, {} changed, {} files synced ({}), {} files and {} directories deleted, {} errors",
            self.dirs_scanned,
            self.dirs_changed,
            self.files_synced,
            format_bytes(self.bytes_synced),
            self.files_deleted,
            self.dirs_deleted,
            self.errors
        )
    }
}

/// Human-readable byte count with one decimal, e.g. `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} PB")
}
