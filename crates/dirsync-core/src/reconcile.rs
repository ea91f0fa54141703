//! Tree reconciler
//!
//! Removes target entries that no longer exist in the source. Files go
//! first, then directories deepest first so that a directory is only judged
//! once its children are gone. A stale directory that still has content is
//! left alone.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dirsync_fs::{EntryTimes, NormalizedPath, RobustnessConfig, io};
use walkdir::WalkDir;

use crate::observer::{SyncEvent, SyncObserver};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub files_deleted: u64,
    pub dirs_deleted: u64,
    pub errors: u64,
}

/// Relative entries of one tree, split by kind, named exactly as on disk.
#[derive(Debug, Default)]
struct TreeListing {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
    /// Subtrees that could not be listed
    unreadable: Vec<PathBuf>,
}

impl TreeListing {
    fn covers(&self, relative: &Path) -> bool {
        self.unreadable.iter().any(|blind| is_within(relative, blind))
    }
}

/// Deletes target-only files and empty target-only directories.
pub struct TreeReconciler<'a> {
    robustness: RobustnessConfig,
    observer: &'a dyn SyncObserver,
}

impl<'a> TreeReconciler<'a> {
    pub fn new(robustness: RobustnessConfig, observer: &'a dyn SyncObserver) -> Self {
        Self {
            robustness,
            observer,
        }
    }

    /// Make `target_root`'s shape match `source_root`'s.
    ///
    /// A missing target is a no-op. Target entries under a source subtree
    /// that could not be listed are never deleted.
    pub fn reconcile(&self, source_root: &Path, target_root: &Path) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        if !target_root.is_dir() {
            return outcome;
        }

        let source = self.list(source_root, &mut outcome);
        let target = self.list(target_root, &mut outcome);
        let mut touched: BTreeSet<PathBuf> = BTreeSet::new();

        for relative in &target.files {
            if source.files.contains(relative) || source.covers(relative) {
                continue;
            }
            let path = target_root.join(relative);
            match io::remove_file(&path, self.robustness) {
                Ok(()) => {
                    outcome.files_deleted += 1;
                    touched.extend(relative.parent().map(Path::to_path_buf));
                    self.observer.on_event(&SyncEvent::FileDeleted {
                        relative: NormalizedPath::new(relative),
                    });
                }
                Err(err) => {
                    outcome.errors += 1;
                    self.observer.on_event(&SyncEvent::DeleteFailed {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        let mut stale: Vec<&PathBuf> = target
            .dirs
            .iter()
            .filter(|relative| !source.dirs.contains(*relative) && !source.covers(relative))
            .collect();
        stale.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

        for relative in stale {
            let path = target_root.join(relative);
            let removed = io::is_empty_dir(&path).and_then(|empty| {
                if empty {
                    io::remove_empty_dir(&path).map(|()| true)
                } else {
                    Ok(false)
                }
            });
            match removed {
                Ok(true) => {
                    outcome.dirs_deleted += 1;
                    touched.remove(relative);
                    touched.extend(relative.parent().map(Path::to_path_buf));
                    self.observer.on_event(&SyncEvent::DirectoryDeleted {
                        relative: NormalizedPath::new(relative),
                    });
                }
                Ok(false) => self.observer.on_event(&SyncEvent::DirectoryKept {
                    relative: NormalizedPath::new(relative),
                }),
                Err(err) => {
                    outcome.errors += 1;
                    self.observer.on_event(&SyncEvent::DeleteFailed {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        // Deleting entries moved these directories' mtimes.
        for relative in touched {
            let is_root = relative.as_os_str().is_empty();
            if !is_root && !source.dirs.contains(&relative) {
                continue;
            }
            let target_dir = target_root.join(&relative);
            let restored = EntryTimes::read(&source_root.join(&relative))
                .and_then(|times| times.apply(&target_dir));
            if let Err(err) = restored {
                outcome.errors += 1;
                self.observer.on_event(&SyncEvent::TimestampNotPreserved {
                    path: target_dir,
                    message: err.to_string(),
                });
            }
        }

        outcome
    }

    /// Full walk of `root`; symlinks are listed as files, never followed.
    fn list(&self, root: &Path, outcome: &mut ReconcileOutcome) -> TreeListing {
        let mut listing = TreeListing::default();

        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            match entry {
                Ok(entry) => {
                    let Ok(relative) = entry.path().strip_prefix(root).map(Path::to_path_buf) else {
                        continue;
                    };
                    if entry.file_type().is_dir() {
                        listing.dirs.insert(relative);
                    } else {
                        listing.files.insert(relative);
                    }
                }
                Err(err) => {
                    outcome.errors += 1;
                    let path = err.path().unwrap_or(root).to_path_buf();
                    listing
                        .unreadable
                        .push(path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_default());
                    self.observer.on_event(&SyncEvent::EntryUnreadable {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        listing
    }
}

/// `path` equals `prefix` or lies below it. The empty prefix covers all.
fn is_within(path: &Path, prefix: &Path) -> bool {
    path.starts_with(prefix)
}

fn depth(relative: &Path) -> usize {
    relative.components().count()
}
