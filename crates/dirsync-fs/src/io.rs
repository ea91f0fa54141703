//! Atomic I/O operations with file locking, and the copy/delete primitives
//! used when mirroring a tree.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::times::EntryTimes;
use crate::{Error, Result};

/// Retry policy for I/O against slow or flaky filesystems.
///
/// A zero `retry_window` disables retries: every operation is attempted
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Total time budget for retrying one operation.
    pub retry_window: Duration,
    /// Delay before the first retry; grows exponentially afterwards.
    pub initial_backoff: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            retry_window: Duration::ZERO,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl RobustnessConfig {
    /// Policy that retries for up to `window`.
    pub fn retrying(window: Duration, initial_backoff: Duration) -> Self {
        Self {
            retry_window: window,
            initial_backoff,
        }
    }

    fn run<T>(&self, mut op: impl FnMut() -> std::io::Result<T>) -> std::io::Result<T> {
        if self.retry_window.is_zero() {
            return op();
        }

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_elapsed_time(Some(self.retry_window))
            .build();

        backoff::retry(policy, || {
            op().map_err(|e| {
                if is_permanent(&e) {
                    backoff::Error::Permanent(e)
                } else {
                    tracing::debug!("Retrying after transient I/O error: {}", e);
                    backoff::Error::transient(e)
                }
            })
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

fn is_permanent(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NotFound
            | ErrorKind::PermissionDenied
            | ErrorKind::AlreadyExists
            | ErrorKind::InvalidInput
    )
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock to prevent concurrent access.
pub fn write_atomic(path: &Path, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    let native_path = path.to_path_buf();

    // Ensure parent directory exists
    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives in the same directory so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let temp_file = robustness
        .run(|| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
        })
        .map_err(|e| Error::io(&temp_path, e))?;

    let written = write_locked(temp_file, &native_path, &temp_path, content).and_then(|()| {
        robustness
            .run(|| fs::rename(&temp_path, &native_path))
            .map_err(|e| Error::io(&native_path, e))
    });
    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

/// Lock, fill and flush the temp file; the lock is released on return.
fn write_locked(mut file: File, native_path: &Path, temp_path: &Path, content: &[u8]) -> Result<()> {
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })?;
    file.write_all(content).map_err(|e| Error::io(temp_path, e))?;
    file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Copy a regular file, overwriting `to`, and carry over its access and
/// modification times.
///
/// Returns the number of bytes copied.
pub fn copy_file(from: &Path, to: &Path, robustness: RobustnessConfig) -> Result<u64> {
    let copy_err = |source| Error::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let bytes = robustness.run(|| fs::copy(from, to)).map_err(copy_err)?;

    let times = EntryTimes::read(from)?;
    robustness
        .run(|| times.apply_raw(to))
        .map_err(|e| Error::io(to, e))?;

    Ok(bytes)
}

/// Create `path` and any missing parents.
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Delete a file (or symlink).
pub fn remove_file(path: &Path, robustness: RobustnessConfig) -> Result<()> {
    robustness
        .run(|| fs::remove_file(path))
        .map_err(|e| Error::io(path, e))
}

/// Delete an empty directory. Never removes contents.
pub fn remove_empty_dir(path: &Path) -> Result<()> {
    fs::remove_dir(path).map_err(|e| Error::io(path, e))
}

/// True when `path` is a directory with no entries.
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn zero_window_runs_once() {
        let attempts = Cell::new(0);
        let result: std::io::Result<()> = RobustnessConfig::default().run(|| {
            attempts.set(attempts.get() + 1);
            Err(std::io::Error::new(ErrorKind::TimedOut, "slow share"))
        });
        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let attempts = Cell::new(0);
        let policy = RobustnessConfig::retrying(Duration::from_secs(2), Duration::from_millis(1));
        let result: std::io::Result<()> = policy.run(|| {
            attempts.set(attempts.get() + 1);
            Err(std::io::Error::new(ErrorKind::NotFound, "gone"))
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn transient_errors_are_retried_until_success() {
        let attempts = Cell::new(0);
        let policy = RobustnessConfig::retrying(Duration::from_secs(5), Duration::from_millis(1));
        let result = policy.run(|| {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 3 {
                Err(std::io::Error::new(ErrorKind::TimedOut, "slow share"))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the state file should go: the rename fails.
        let blocked = dir.path().join("last_sync.json");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let result = write_atomic(&blocked, b"{}", RobustnessConfig::default());

        assert!(result.is_err());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }
}
