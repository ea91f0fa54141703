//! Manifest and state file resolution shared by the commands

use std::path::{Path, PathBuf};

use dirsync_core::{Manifest, TimestampStore, default_manifest_path};

use crate::error::{CliError, Result};

/// Everything a command needs to know about the configured jobs.
#[derive(Debug)]
pub struct Context {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub state_path: PathBuf,
}

impl Context {
    /// Load the manifest from `config`, or the platform default location.
    ///
    /// `state` overrides the state file the manifest names.
    pub fn load(config: Option<&Path>, state: Option<&Path>) -> Result<Self> {
        let manifest_path = match config {
            Some(path) => path.to_path_buf(),
            None => default_manifest_path().ok_or_else(|| {
                CliError::user("No configuration directory on this platform; pass --config")
            })?,
        };

        let manifest = Manifest::load(&manifest_path)?;
        let state_path = state
            .map(Path::to_path_buf)
            .unwrap_or_else(|| manifest.state_path(&manifest_path));
        tracing::debug!("State file: {}", state_path.display());

        Ok(Self {
            manifest_path,
            manifest,
            state_path,
        })
    }

    pub fn open_store(&self) -> TimestampStore {
        TimestampStore::open(&self.state_path)
    }
}
