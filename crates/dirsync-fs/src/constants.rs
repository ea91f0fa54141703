//! Well-known file and directory names.

use std::path::Path;

/// Default names used when the user does not supply explicit paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPath {
    /// Directory under the platform config dir holding our files
    AppDir,
    /// The job manifest
    Manifest,
    /// Persisted last-sync timestamps, one entry per job
    StateFile,
}

impl DefaultPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppDir => "dirsync",
            Self::Manifest => "config.toml",
            Self::StateFile => "last_sync.json",
        }
    }
}

impl AsRef<Path> for DefaultPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for DefaultPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for DefaultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
