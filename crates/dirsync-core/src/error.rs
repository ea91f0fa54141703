//! Error types for dirsync-core

use std::path::PathBuf;

/// Result type for dirsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dirsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Manifest file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Manifest parsed but is not usable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Two jobs share a name
    #[error("Duplicate job name: {name}")]
    DuplicateJob { name: String },

    /// A requested job name is not in the manifest
    #[error("Unknown job: {name}")]
    UnknownJob { name: String },

    /// The source root of a job does not exist or is not a directory
    #[error("Source does not exist: {path}")]
    SourceMissing { path: PathBuf },

    /// Source and target overlap, mirroring would recurse into itself
    #[error("Source {source_root} and target {target_root} overlap")]
    OverlappingRoots {
        source_root: PathBuf,
        target_root: PathBuf,
    },

    /// The source root could not be walked at all
    #[error("Cannot scan {path}: {message}")]
    ScanFailed { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from dirsync-fs
    #[error(transparent)]
    Fs(#[from] dirsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
