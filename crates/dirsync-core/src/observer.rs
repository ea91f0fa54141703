//! Progress reporting
//!
//! Components never log directly; they emit [`SyncEvent`]s through an
//! injected [`SyncObserver`]. The CLI plugs in [`TracingObserver`], tests use
//! [`RecordingObserver`] to assert on what happened.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dirsync_fs::NormalizedPath;
use tracing::{debug, error, info, warn};

use crate::state::format_timestamp;
use crate::sync::{SyncOutcome, SyncPhase, SyncStatistics, format_bytes};

/// Something worth reporting during a sync run.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A job is about to run
    Started {
        name: String,
        source: PathBuf,
        target: PathBuf,
        since: DateTime<Utc>,
    },
    /// The orchestrator moved to another phase
    PhaseChanged { phase: SyncPhase },
    /// A root lives on a filesystem where directory mtimes may lie
    NetworkPath { path: PathBuf },
    /// Files directly in the source root were copied
    RootMirrored { files: u64 },
    /// The change scan finished
    ScanCompleted { scanned: u64, changed: u64 },
    /// An entry could not be examined while walking a tree
    EntryUnreadable { path: PathBuf, message: String },
    /// All files of a changed directory were processed
    DirectoryMirrored { relative: NormalizedPath, files: u64 },
    /// A changed directory could not be mirrored at all
    DirectoryFailed { relative: NormalizedPath, message: String },
    /// A single file copy failed
    CopyFailed { path: PathBuf, message: String },
    /// Timestamps could not be carried over
    TimestampNotPreserved { path: PathBuf, message: String },
    /// A stale target file was removed
    FileDeleted { relative: NormalizedPath },
    /// A stale, empty target directory was removed
    DirectoryDeleted { relative: NormalizedPath },
    /// A stale target directory still has content and was kept
    DirectoryKept { relative: NormalizedPath },
    /// A deletion failed
    DeleteFailed { path: PathBuf, message: String },
    /// Progress was persisted mid-run
    Checkpoint {
        timestamp: DateTime<Utc>,
        processed: usize,
        total: usize,
    },
    /// Mirroring finished; rate is directories per second
    MirrorRate { directories: usize, per_second: f64 },
    /// The job is over
    Finished {
        name: String,
        outcome: SyncOutcome,
        stats: SyncStatistics,
    },
}

/// Receiver of [`SyncEvent`]s.
pub trait SyncObserver {
    fn on_event(&self, event: &SyncEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SyncObserver for NullObserver {
    fn on_event(&self, _event: &SyncEvent) {}
}

/// Writes events to `tracing`, in the shape of a classic sync log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_event(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Started {
                name,
                source,
                target,
                since,
            } => {
                info!("{}", "=".repeat(60));
                info!("Config: {}", name);
                info!("Source: {}", source.display());
                info!("Target: {}", target.display());
                info!("Last sync: {}", since.format("%Y-%m-%d %H:%M:%S"));
            }
            SyncEvent::PhaseChanged { phase } => debug!("Phase: {:?}", phase),
            SyncEvent::NetworkPath { path } => warn!(
                "{} looks like a network path; directory mtimes may not reflect changes",
                path.display()
            ),
            SyncEvent::RootMirrored { files } => debug!("Root files synced: {}", files),
            SyncEvent::ScanCompleted { scanned, changed } => {
                info!("Scanned {} directories", scanned);
                info!("Found {} changed directories", changed);
            }
            SyncEvent::EntryUnreadable { path, message } => {
                error!("Error checking {}: {}", path.display(), message)
            }
            SyncEvent::DirectoryMirrored { relative, files } => {
                if *files > 0 {
                    info!("Synced: {}/ ({} files)", relative, files);
                } else {
                    debug!("Synced: {}/ (no files)", relative);
                }
            }
            SyncEvent::DirectoryFailed { relative, message } => {
                error!("Error syncing directory {}: {}", relative, message)
            }
            SyncEvent::CopyFailed { path, message } => {
                error!("Error copying {}: {}", path.display(), message)
            }
            SyncEvent::TimestampNotPreserved { path, message } => warn!(
                "Could not preserve timestamp for {}: {}",
                path.display(),
                message
            ),
            SyncEvent::FileDeleted { relative } => info!("Deleted file: {}", relative),
            SyncEvent::DirectoryDeleted { relative } => info!("Deleted directory: {}/", relative),
            SyncEvent::DirectoryKept { relative } => warn!(
                "Kept {}/: not in source but still has content",
                relative
            ),
            SyncEvent::DeleteFailed { path, message } => {
                error!("Error deleting {}: {}", path.display(), message)
            }
            SyncEvent::Checkpoint {
                timestamp,
                processed,
                total,
            } => info!(
                "Checkpoint {}/{}: {}",
                processed,
                total,
                format_timestamp(*timestamp)
            ),
            SyncEvent::MirrorRate {
                directories,
                per_second,
            } => info!("Mirrored {} directories ({:.1}/s)", directories, per_second),
            SyncEvent::Finished {
                name,
                outcome,
                stats,
            } => {
                info!("{}", "-".repeat(60));
                info!("Directories scanned: {}", stats.dirs_scanned);
                info!("Directories changed: {}", stats.dirs_changed);
                info!("Files synced: {}", stats.files_synced);
                info!("Files deleted: {}", stats.files_deleted);
                info!("Directories deleted: {}", stats.dirs_deleted);
                info!("Data synced: {}", format_bytes(stats.bytes_synced));
                info!("Errors: {}", stats.errors);
                match outcome {
                    SyncOutcome::Completed => info!("{}: completed", name),
                    SyncOutcome::Interrupted => warn!("{}: interrupted, progress saved", name),
                    SyncOutcome::Failed { reason } => error!("{}: failed: {}", name, reason),
                }
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Recorded events matching `predicate`.
    pub fn matching(&self, predicate: impl Fn(&SyncEvent) -> bool) -> Vec<SyncEvent> {
        self.events().into_iter().filter(|e| predicate(e)).collect()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_event(&self, event: &SyncEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Forwards each event to several observers, in order.
pub struct FanoutObserver<'a> {
    observers: Vec<&'a dyn SyncObserver>,
}

impl<'a> FanoutObserver<'a> {
    pub fn new(observers: Vec<&'a dyn SyncObserver>) -> Self {
        Self { observers }
    }
}

impl SyncObserver for FanoutObserver<'_> {
    fn on_event(&self, event: &SyncEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
