//! Job manifest and settings
//!
//! The manifest is looked up in this order:
//!
//! 1. An explicit path (`--config`, or `DIRSYNC_CONFIG`)
//! 2. `<platform config dir>/dirsync/config.toml`
//!
//! # Example
//!
//! ```toml
//! [settings]
//! checkpoint_interval = 50
//! batch_size = 50
//! batch_pause_ms = 250
//!
//! [[sync]]
//! name = "calibre"
//! source = "~/Calibre Library"
//! target = "/mnt/nas/Calibre Library"
//! ```

mod manifest;

use std::path::PathBuf;

use dirsync_fs::DefaultPath;

pub use manifest::{Manifest, SyncJob, SyncSettings};

/// Platform default manifest location, if a config dir exists.
pub fn default_manifest_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(DefaultPath::AppDir).join(DefaultPath::Manifest))
}
