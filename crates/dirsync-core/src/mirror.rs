//! Directory mirror
//!
//! Copies the regular files directly inside one source directory into its
//! counterpart under the target root, then carries the source directory's
//! times over. Subdirectories are never descended into; each changed
//! subdirectory arrives as its own [`DirectoryRecord`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dirsync_fs::{EntryTimes, NormalizedPath, RobustnessConfig, io};

use crate::Result;
use crate::observer::{SyncEvent, SyncObserver};
use crate::scan::DirectoryRecord;

/// Result of mirroring one directory (or the root).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorOutcome {
    pub files_copied: u64,
    pub bytes_copied: u64,
    pub errors: u64,
    /// Every file landed. Timestamp failures do not clear this.
    pub complete: bool,
    /// The target directory is in place. Only this holds the resume point
    /// back; per-file failures are reported and left behind.
    pub target_ready: bool,
}

impl MirrorOutcome {
    fn failed() -> Self {
        Self {
            errors: 1,
            ..Self::default()
        }
    }
}

/// Copies directory contents from the source tree into the target tree.
pub struct DirectoryMirror<'a> {
    robustness: RobustnessConfig,
    observer: &'a dyn SyncObserver,
}

impl<'a> DirectoryMirror<'a> {
    pub fn new(robustness: RobustnessConfig, observer: &'a dyn SyncObserver) -> Self {
        Self {
            robustness,
            observer,
        }
    }

    /// Mirror the files directly inside `source_root`.
    ///
    /// Runs on every sync regardless of change detection.
    ///
    /// # Errors
    ///
    /// Fails when `target_root` cannot be created; the job cannot proceed.
    pub fn mirror_root(&self, source_root: &Path, target_root: &Path) -> Result<MirrorOutcome> {
        io::create_dir_all(target_root)?;

        let mut outcome = self.copy_files(source_root, target_root)?;
        self.stamp(source_root, target_root, &mut outcome);

        self.observer.on_event(&SyncEvent::RootMirrored {
            files: outcome.files_copied,
        });
        Ok(outcome)
    }

    /// Mirror one changed directory.
    ///
    /// Failures are folded into the outcome. A directory whose target cannot
    /// be created comes back not `target_ready`; one whose source cannot be
    /// listed comes back incomplete with no files copied.
    pub fn mirror_directory(
        &self,
        source_root: &Path,
        target_root: &Path,
        record: &DirectoryRecord,
    ) -> MirrorOutcome {
        let target_dir = target_root.join(&record.relative);
        let label = NormalizedPath::new(&record.relative);

        let created_in = match create_components(target_root, &record.relative) {
            Ok(parents) => parents,
            Err(err) => {
                self.observer.on_event(&SyncEvent::DirectoryFailed {
                    relative: label,
                    message: err.to_string(),
                });
                return MirrorOutcome::failed();
            }
        };

        let mut outcome = match self.copy_files(&record.path, &target_dir) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.observer.on_event(&SyncEvent::DirectoryFailed {
                    relative: label,
                    message: err.to_string(),
                });
                return MirrorOutcome {
                    target_ready: true,
                    ..MirrorOutcome::failed()
                };
            }
        };

        if let Err(err) = record.times.apply(&target_dir) {
            outcome.errors += 1;
            self.observer.on_event(&SyncEvent::TimestampNotPreserved {
                path: target_dir.clone(),
                message: err.to_string(),
            });
        }

        // Creating a subdirectory moved each of these parents' mtime.
        for parent in created_in {
            self.stamp(&source_root.join(&parent), &target_root.join(&parent), &mut outcome);
        }

        self.observer.on_event(&SyncEvent::DirectoryMirrored {
            relative: label,
            files: outcome.files_copied,
        });
        outcome
    }

    /// Copy every regular file directly inside `source_dir`, in name order.
    fn copy_files(&self, source_dir: &Path, target_dir: &Path) -> Result<MirrorOutcome> {
        let mut entries = fs::read_dir(source_dir)
            .map_err(|e| dirsync_fs::Error::io(source_dir, e))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| dirsync_fs::Error::io(source_dir, e))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut outcome = MirrorOutcome {
            complete: true,
            target_ready: true,
            ..MirrorOutcome::default()
        };

        for entry in entries {
            let source = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    outcome.errors += 1;
                    outcome.complete = false;
                    self.observer.on_event(&SyncEvent::CopyFailed {
                        path: source,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let target = target_dir.join(entry.file_name());
            match io::copy_file(&source, &target, self.robustness) {
                Ok(bytes) => {
                    outcome.files_copied += 1;
                    outcome.bytes_copied += bytes;
                }
                Err(err @ dirsync_fs::Error::Copy { .. }) => {
                    outcome.errors += 1;
                    outcome.complete = false;
                    self.observer.on_event(&SyncEvent::CopyFailed {
                        path: source,
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    // Content is in place, only the times are off.
                    outcome.files_copied += 1;
                    outcome.bytes_copied += metadata.len();
                    outcome.errors += 1;
                    self.observer.on_event(&SyncEvent::TimestampNotPreserved {
                        path: target,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Carry `source`'s times onto `target`, folding failure into `outcome`.
    fn stamp(&self, source: &Path, target: &Path, outcome: &mut MirrorOutcome) {
        let applied = EntryTimes::read(source).and_then(|times| times.apply(target));
        if let Err(err) = applied {
            outcome.errors += 1;
            self.observer.on_event(&SyncEvent::TimestampNotPreserved {
                path: target.to_path_buf(),
                message: err.to_string(),
            });
        }
    }
}

/// Create each missing component of `relative` under `root`, one level at a
/// time. Returns the (relative) directories that gained a new child.
fn create_components(root: &Path, relative: &Path) -> dirsync_fs::Result<Vec<PathBuf>> {
    let mut touched = Vec::new();
    let mut current = PathBuf::new();

    for component in relative.components() {
        let next = current.join(component);
        let path = root.join(&next);
        match fs::create_dir(&path) {
            Ok(()) => touched.push(current),
            Err(err) if err.kind() == ErrorKind::AlreadyExists && path.is_dir() => {}
            Err(err) => return Err(dirsync_fs::Error::io(path, err)),
        }
        current = next;
    }

    Ok(touched)
}
