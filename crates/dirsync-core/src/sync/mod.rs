//! Job orchestration
//!
//! This module provides:
//! - **engine**: the per-job state machine (root sync, scan, mirror, reconcile)
//! - **batch**: sequential runs over a job list, persisting each job's progress
//! - **stats**: counters and byte formatting for reports

mod batch;
mod engine;
mod stats;

pub use batch::{BatchRunner, BatchSummary};
pub use engine::{SyncEngine, SyncOutcome, SyncPhase, SyncReport};
pub use stats::{SyncStatistics, format_bytes};
