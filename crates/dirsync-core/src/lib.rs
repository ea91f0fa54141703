//! One-way directory mirroring with resumable, mtime-based change detection
//!
//! This crate implements:
//!
//! - **Timestamp store**: per-job last-sync thresholds, persisted as JSON
//! - **Change scanner**: finds directories whose mtime moved past the threshold
//! - **Directory mirror**: copies a changed directory's files and times
//! - **Tree reconciler**: removes target entries that left the source
//! - **SyncEngine / BatchRunner**: orchestration, checkpoints, cancellation
//!
//! # Architecture
//!
//! ```text
//!                    dirsync-cli
//!                        |
//!                   dirsync-core
//!       +--------+-------+-------+-----------+
//!       |        |       |       |           |
//!     state    scan    mirror  reconcile   sync
//!                        |
//!                   dirsync-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dirsync_core::{BatchRunner, CancelFlag, Manifest, TimestampStore, TracingObserver};
//!
//! fn example() -> dirsync_core::Result<()> {
//!     let path = std::path::Path::new("config.toml");
//!     let manifest = Manifest::load(path)?;
//!     let mut store = TimestampStore::open(manifest.state_path(path));
//!
//!     let runner = BatchRunner::new(manifest.settings.clone(), &TracingObserver, CancelFlag::new());
//!     let summary = runner.run(&manifest.jobs, &mut store);
//!     println!("{} succeeded", summary.succeeded);
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod mirror;
pub mod observer;
pub mod reconcile;
pub mod scan;
pub mod state;
pub mod sync;

pub use cancel::CancelFlag;
pub use config::{Manifest, SyncJob, SyncSettings, default_manifest_path};
pub use error::{Error, Result};
pub use mirror::{DirectoryMirror, MirrorOutcome};
pub use observer::{FanoutObserver, NullObserver, RecordingObserver, SyncEvent, SyncObserver, TracingObserver};
pub use reconcile::{ReconcileOutcome, TreeReconciler};
pub use scan::{ChangeScanner, DirectoryRecord, ScanResult};
pub use state::{TimestampStore, epoch, format_timestamp, parse_timestamp};
pub use sync::{
    BatchRunner, BatchSummary, SyncEngine, SyncOutcome, SyncPhase, SyncReport, SyncStatistics, format_bytes,
};
