//! Access/modification timestamps of files and directories

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use filetime::FileTime;

use crate::{Error, Result};

/// The pair of timestamps carried from a source entry onto its mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTimes {
    pub accessed: FileTime,
    pub modified: FileTime,
}

impl EntryTimes {
    /// Capture times from already-fetched metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            accessed: FileTime::from_last_access_time(metadata),
            modified: FileTime::from_last_modification_time(metadata),
        }
    }

    /// Stat `path` (following symlinks) and capture its times.
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::from_metadata(&metadata))
    }

    /// Set both times on `path`. Works for directories as well as files.
    pub fn apply(&self, path: &Path) -> Result<()> {
        self.apply_raw(path).map_err(|e| Error::io(path, e))
    }

    pub(crate) fn apply_raw(&self, path: &Path) -> std::io::Result<()> {
        filetime::set_file_times(path, self.accessed, self.modified)
    }

    /// Modification time as a `SystemTime`.
    pub fn modified_system_time(&self) -> SystemTime {
        to_system_time(self.modified)
    }
}

/// Copy `from`'s access and modification times onto `to`.
pub fn copy_times(from: &Path, to: &Path) -> Result<()> {
    EntryTimes::read(from)?.apply(to)
}

fn to_system_time(time: FileTime) -> SystemTime {
    let seconds = time.unix_seconds();
    let nanos = std::time::Duration::from_nanos(u64::from(time.nanoseconds()));
    if seconds >= 0 {
        SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(seconds.unsigned_abs()) + nanos
    } else {
        SystemTime::UNIX_EPOCH - std::time::Duration::from_secs(seconds.unsigned_abs()) + nanos
    }
}
