//! Sequential execution of several jobs

use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::config::{SyncJob, SyncSettings};
use crate::observer::SyncObserver;
use crate::state::TimestampStore;

use super::engine::{SyncEngine, SyncOutcome, SyncReport};

/// Aggregate result of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// One report per job that ran, in run order
    pub reports: Vec<SyncReport>,
    pub succeeded: usize,
    pub failed: usize,
    pub interrupted: usize,
    /// Jobs never started because cancellation came first
    pub skipped: Vec<String>,
}

impl BatchSummary {
    /// True when every job ran and completed.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.interrupted == 0 && self.skipped.is_empty()
    }
}

/// Runs jobs one after another, isolating failures per job.
///
/// After each job the returned watermark is persisted, whatever the
/// outcome, unless the job stopped before touching its target (missing
/// source, overlapping roots, cancelled first).
pub struct BatchRunner<'a> {
    engine: SyncEngine<'a>,
    cancel: CancelFlag,
}

impl<'a> BatchRunner<'a> {
    pub fn new(settings: SyncSettings, observer: &'a dyn SyncObserver, cancel: CancelFlag) -> Self {
        Self {
            engine: SyncEngine::new(settings, observer, cancel.clone()),
            cancel,
        }
    }

    pub fn run(&self, jobs: &[SyncJob], store: &mut TimestampStore) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for job in jobs {
            if self.cancel.is_cancelled() {
                tracing::warn!("Skipping {}: cancelled", job.name);
                summary.skipped.push(job.name.clone());
                continue;
            }

            let report = self.engine.run(job, store);
            if report.reached_target() && !store.set_last_sync(&job.name, report.newest_synced) {
                tracing::warn!("Progress for {} is kept in memory only", job.name);
            }

            match report.outcome {
                SyncOutcome::Completed => summary.succeeded += 1,
                SyncOutcome::Interrupted => summary.interrupted += 1,
                SyncOutcome::Failed { .. } => summary.failed += 1,
            }
            summary.reports.push(report);
        }

        tracing::info!(
            "Batch finished: {} succeeded, {} failed, {} interrupted, {} skipped",
            summary.succeeded,
            summary.failed,
            summary.interrupted,
            summary.skipped.len()
        );
        summary
    }
}
