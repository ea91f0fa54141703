//! SyncEngine implementation
//!
//! Runs one job through `RootSync -> Scanning -> Mirroring -> Reconciling`.
//! Changed directories are mirrored oldest first, and the returned
//! watermark only covers directories that are fully mirrored, so resuming
//! from any persisted value never skips pending work.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dirsync_fs::NormalizedPath;
use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::config::{SyncJob, SyncSettings};
use crate::mirror::DirectoryMirror;
use crate::observer::{SyncEvent, SyncObserver};
use crate::reconcile::TreeReconciler;
use crate::scan::{ChangeScanner, DirectoryRecord};
use crate::state::TimestampStore;
use crate::{Error, Result};

use super::stats::SyncStatistics;

/// How a job's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every phase ran, reconciliation included
    Completed,
    /// Cancelled; progress up to the watermark is kept
    Interrupted,
    /// Stopped by a job-level error
    Failed { reason: String },
}

/// Where a job's run is (or stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    RootSync,
    Scanning,
    Mirroring,
    Checkpoint,
    Reconciling,
    Done,
    Interrupted,
    Failed,
}

/// Report for one job's run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    /// Job name
    pub name: String,
    pub outcome: SyncOutcome,
    /// Threshold this run started from
    pub since: DateTime<Utc>,
    /// Safe new threshold; never below `since`
    pub newest_synced: DateTime<Utc>,
    /// Last phase entered before the run ended
    pub last_phase: SyncPhase,
    pub stats: SyncStatistics,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.outcome == SyncOutcome::Completed
    }

    /// True when the run earned a newer threshold than it started with.
    pub fn advanced(&self) -> bool {
        self.newest_synced > self.since
    }

    /// True when the run got past the root checks and touched the target.
    pub fn reached_target(&self) -> bool {
        self.last_phase != SyncPhase::Idle
    }
}

/// Mutable state of one run.
struct Progress {
    phase: SyncPhase,
    since: DateTime<Utc>,
    watermark: DateTime<Utc>,
    /// Cleared by the first directory whose target could not be created; the
    /// watermark then stays put
    frontier_open: bool,
    stats: SyncStatistics,
}

/// Engine for mirroring jobs
///
/// One engine can run any number of jobs in sequence; every run starts with
/// fresh statistics.
pub struct SyncEngine<'a> {
    settings: SyncSettings,
    observer: &'a dyn SyncObserver,
    cancel: CancelFlag,
}

impl<'a> SyncEngine<'a> {
    pub fn new(settings: SyncSettings, observer: &'a dyn SyncObserver, cancel: CancelFlag) -> Self {
        Self {
            settings,
            observer,
            cancel,
        }
    }

    /// Run `job` once.
    ///
    /// Reads the job's threshold from `store` and writes checkpoints to it
    /// while mirroring. Persisting the final `newest_synced` is left to the
    /// caller. Never fails: job-level errors come back as
    /// [`SyncOutcome::Failed`].
    pub fn run(&self, job: &SyncJob, store: &mut TimestampStore) -> SyncReport {
        let started = Instant::now();
        let since = store.get_last_sync(&job.name);
        let mut progress = Progress {
            phase: SyncPhase::Idle,
            since,
            watermark: since,
            frontier_open: true,
            stats: SyncStatistics::default(),
        };

        self.observer.on_event(&SyncEvent::Started {
            name: job.name.clone(),
            source: job.source.clone(),
            target: job.target.clone(),
            since,
        });

        let outcome = match self.execute(job, store, &mut progress) {
            Ok(outcome) => outcome,
            Err(err) => {
                progress.stats.record_error();
                SyncOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        let final_phase = match outcome {
            SyncOutcome::Completed => SyncPhase::Done,
            SyncOutcome::Interrupted => SyncPhase::Interrupted,
            SyncOutcome::Failed { .. } => SyncPhase::Failed,
        };
        let last_phase = progress.phase;
        self.enter(&mut progress, final_phase);

        progress.stats.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.observer.on_event(&SyncEvent::Finished {
            name: job.name.clone(),
            outcome: outcome.clone(),
            stats: progress.stats.clone(),
        });

        SyncReport {
            name: job.name.clone(),
            outcome,
            since,
            newest_synced: progress.watermark,
            last_phase,
            stats: progress.stats,
        }
    }

    fn execute(
        &self,
        job: &SyncJob,
        store: &mut TimestampStore,
        progress: &mut Progress,
    ) -> Result<SyncOutcome> {
        check_roots(&job.source, &job.target)?;
        for root in [&job.source, &job.target] {
            if NormalizedPath::new(root).is_network_path() {
                self.observer.on_event(&SyncEvent::NetworkPath { path: root.clone() });
            }
        }

        let robustness = self.settings.robustness();
        let mirror = DirectoryMirror::new(robustness, self.observer);

        if self.cancel.is_cancelled() {
            return Ok(SyncOutcome::Interrupted);
        }
        self.enter(progress, SyncPhase::RootSync);
        let root = mirror.mirror_root(&job.source, &job.target)?;
        progress.stats.absorb_mirror(&root);

        self.enter(progress, SyncPhase::Scanning);
        let scan = ChangeScanner::new(self.observer).scan(&job.source, progress.since)?;
        progress.stats.absorb_scan(&scan);

        if !scan.changed.is_empty() {
            self.enter(progress, SyncPhase::Mirroring);
            if !self.mirror_changed(job, &mirror, &scan.changed, store, progress) {
                return Ok(SyncOutcome::Interrupted);
            }
        }

        self.enter(progress, SyncPhase::Reconciling);
        let reconciled = TreeReconciler::new(robustness, self.observer).reconcile(&job.source, &job.target);
        progress.stats.absorb_reconcile(&reconciled);

        Ok(SyncOutcome::Completed)
    }

    /// Mirror `changed` in order. Returns false when cancelled part way.
    fn mirror_changed(
        &self,
        job: &SyncJob,
        mirror: &DirectoryMirror<'_>,
        changed: &[DirectoryRecord],
        store: &mut TimestampStore,
        progress: &mut Progress,
    ) -> bool {
        let started = Instant::now();
        let total = changed.len();
        let mut checkpointed = progress.since;

        for (index, record) in changed.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return false;
            }

            let outcome = mirror.mirror_directory(&job.source, &job.target, record);
            progress.stats.absorb_mirror(&outcome);

            if !outcome.target_ready {
                progress.frontier_open = false;
            }
            let next = changed.get(index + 1).map(|r| r.modified);
            if progress.frontier_open && next.is_none_or(|next| next > record.modified) {
                progress.watermark = progress.watermark.max(record.modified);
            }

            let processed = index + 1;
            if self.settings.checkpoint_interval > 0
                && processed % self.settings.checkpoint_interval == 0
                && processed < total
                && progress.watermark > checkpointed
            {
                self.enter(progress, SyncPhase::Checkpoint);
                store.set_last_sync(&job.name, progress.watermark);
                checkpointed = progress.watermark;
                self.observer.on_event(&SyncEvent::Checkpoint {
                    timestamp: progress.watermark,
                    processed,
                    total,
                });
                self.enter(progress, SyncPhase::Mirroring);
            }

            if self.settings.batch_size > 0
                && processed % self.settings.batch_size == 0
                && processed < total
                && !self.settings.batch_pause().is_zero()
            {
                if self.cancel.is_cancelled() {
                    return false;
                }
                thread::sleep(self.settings.batch_pause());
            }
        }

        let seconds = started.elapsed().as_secs_f64();
        self.observer.on_event(&SyncEvent::MirrorRate {
            directories: total,
            per_second: if seconds > 0.0 { total as f64 / seconds } else { total as f64 },
        });
        true
    }

    fn enter(&self, progress: &mut Progress, phase: SyncPhase) {
        progress.phase = phase;
        self.observer.on_event(&SyncEvent::PhaseChanged { phase });
    }
}

/// Fail fast on a missing source, or on roots nested inside one another.
fn check_roots(source: &Path, target: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(Error::SourceMissing {
            path: source.to_path_buf(),
        });
    }

    let source_real = dunce::canonicalize(source)?;
    let target_real = resolve_existing(target)?;
    if target_real.starts_with(&source_real) || source_real.starts_with(&target_real) {
        return Err(Error::OverlappingRoots {
            source_root: source.to_path_buf(),
            target_root: target.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
fn resolve_existing(path: &Path) -> Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if current.exists() {
            let mut resolved = dunce::canonicalize(current)?;
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
}
