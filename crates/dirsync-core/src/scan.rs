//! Change scanner
//!
//! Walks the source tree once and reports every directory whose mtime is
//! strictly newer than the last sync. A directory's mtime moves when an
//! entry is added, removed or renamed directly inside it; rewriting a file
//! in place does not move it, so such edits go unnoticed until something
//! else touches the directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirsync_fs::{EntryTimes, NormalizedPath};
use walkdir::WalkDir;

use crate::observer::{SyncEvent, SyncObserver};
use crate::state::from_file_time;
use crate::{Error, Result};

/// A changed directory, as seen at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Absolute path in the source tree
    pub path: PathBuf,
    /// Path relative to the source root, exactly as on disk
    pub relative: PathBuf,
    /// Modification time at scan time
    pub modified: DateTime<Utc>,
    /// Raw times, carried onto the target directory after mirroring
    pub times: EntryTimes,
}

/// What one scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Changed directories, oldest mtime first (ties by relative path)
    pub changed: Vec<DirectoryRecord>,
    /// Directories visited, the root included
    pub scanned: u64,
    /// Entries that could not be examined
    pub errors: u64,
}

/// Detects changed directories by comparing mtimes with a threshold.
pub struct ChangeScanner<'a> {
    observer: &'a dyn SyncObserver,
}

impl<'a> ChangeScanner<'a> {
    pub fn new(observer: &'a dyn SyncObserver) -> Self {
        Self { observer }
    }

    /// Walk `source_root` and collect directories modified after `since`.
    ///
    /// The root itself is counted but never reported; its files are always
    /// mirrored separately. Unreadable entries are reported and skipped.
    ///
    /// # Errors
    ///
    /// Fails only when the root itself cannot be read.
    pub fn scan(&self, source_root: &Path, since: DateTime<Utc>) -> Result<ScanResult> {
        let mut result = ScanResult::default();

        for entry in WalkDir::new(source_root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(Error::ScanFailed {
                        path: source_root.to_path_buf(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    result.errors += 1;
                    self.observer.on_event(&SyncEvent::EntryUnreadable {
                        path: err.path().unwrap_or(source_root).to_path_buf(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }
            result.scanned += 1;
            if entry.depth() == 0 {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    result.errors += 1;
                    self.observer.on_event(&SyncEvent::EntryUnreadable {
                        path: entry.path().to_path_buf(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let times = EntryTimes::from_metadata(&metadata);
            let modified = from_file_time(times.modified);
            if modified > since {
                let Ok(relative) = entry.path().strip_prefix(source_root).map(Path::to_path_buf) else {
                    continue;
                };
                tracing::debug!("Changed: {} ({})", NormalizedPath::new(&relative), modified);
                result.changed.push(DirectoryRecord {
                    path: entry.into_path(),
                    relative,
                    modified,
                    times,
                });
            }
        }

        result
            .changed
            .sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.relative.cmp(&b.relative)));

        self.observer.on_event(&SyncEvent::ScanCompleted {
            scanned: result.scanned,
            changed: result.changed.len() as u64,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use crate::state::epoch;
    use filetime::FileTime;
    use std::fs;
    use tempfile::tempdir;

    fn pin(path: &Path, secs: i64) {
        let t = FileTime::from_unix_time(secs, 0);
        filetime::set_file_times(path, t, t).unwrap();
    }

    #[test]
    fn root_is_counted_but_never_changed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("metadata.db"), "db").unwrap();

        let result = ChangeScanner::new(&NullObserver).scan(dir.path(), epoch()).unwrap();

        assert_eq!(result.scanned, 1);
        assert!(result.changed.is_empty());
    }

    #[test]
    fn comparison_is_strict() {
        let dir = tempdir().unwrap();
        let at = dir.path().join("at");
        let after = dir.path().join("after");
        fs::create_dir(&at).unwrap();
        fs::create_dir(&after).unwrap();
        pin(&at, 1_000);
        pin(&after, 1_001);

        let since = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        let result = ChangeScanner::new(&NullObserver).scan(dir.path(), since).unwrap();

        let changed: Vec<_> = result.changed.iter().map(|r| r.relative.as_path()).collect();
        assert_eq!(changed, vec![Path::new("after")]);
        assert_eq!(result.scanned, 3);
    }

    #[test]
    fn results_are_ordered_by_mtime() {
        let dir = tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        pin(&dir.path().join("a"), 3_000);
        pin(&dir.path().join("b"), 1_000);
        pin(&dir.path().join("c"), 2_000);

        let result = ChangeScanner::new(&NullObserver).scan(dir.path(), epoch()).unwrap();

        let order: Vec<_> = result.changed.iter().map(|r| r.relative.as_path()).collect();
        assert_eq!(order, vec![Path::new("b"), Path::new("c"), Path::new("a")]);
    }

    #[test]
    fn missing_root_fails() {
        let dir = tempdir().unwrap();
        let result = ChangeScanner::new(&NullObserver).scan(&dir.path().join("gone"), epoch());
        assert!(matches!(result, Err(Error::ScanFailed { .. })));
    }
}
