//! Timestamp store: the only durable state of the system
//!
//! Maps job name -> timestamp of the last completed (or checkpointed) sync.
//! The whole mapping is loaded at open and rewritten on every update.
//! Read and write failures are logged, never raised: a store that cannot be
//! read behaves as "never synced", and a store that cannot be written keeps
//! its in-memory state authoritative for the rest of the process.

mod timestamp;

pub use timestamp::{epoch, format_timestamp, from_file_time, parse_timestamp};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirsync_fs::ConfigStore;
use serde_json::Value;

/// Persisted last-sync timestamps, keyed by job name.
///
/// Values are kept as loaded, so keys and values this version does not
/// understand survive a rewrite untouched.
#[derive(Debug)]
pub struct TimestampStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
    store: ConfigStore,
}

impl TimestampStore {
    /// Open the store at `path`, loading whatever is there.
    ///
    /// A missing file is an empty store. An unreadable or unparsable file is
    /// logged and also treated as empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let store = ConfigStore::new();

        let entries = if path.exists() {
            match store.load::<BTreeMap<String, Value>>(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("Error loading state file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            tracing::debug!("No state file at {}, starting fresh", path.display());
            BTreeMap::new()
        };

        Self {
            path,
            entries,
            store,
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Threshold for change detection: the stored timestamp, or the epoch
    /// when absent or unparsable.
    pub fn get_last_sync(&self, name: &str) -> DateTime<Utc> {
        match self.entries.get(name) {
            None => epoch(),
            Some(value) => match value.as_str().and_then(parse_timestamp) {
                Some(ts) => ts,
                None => {
                    tracing::error!("Error parsing timestamp for {}: {}", name, value);
                    epoch()
                }
            },
        }
    }

    /// The parsed stored timestamp, without the epoch fallback.
    pub fn stored(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(name)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }

    /// Upsert `name` and persist the whole mapping immediately.
    ///
    /// Returns whether the write reached disk. The in-memory value is updated
    /// either way.
    pub fn set_last_sync(&mut self, name: &str, timestamp: DateTime<Utc>) -> bool {
        self.entries
            .insert(name.to_string(), Value::String(format_timestamp(timestamp)));
        self.persist()
    }

    /// Forget `name`, so its next run starts from the epoch.
    ///
    /// Returns false when there was nothing to forget or the write failed.
    pub fn clear_last_sync(&mut self, name: &str) -> bool {
        if self.entries.remove(name).is_none() {
            return false;
        }
        self.persist()
    }

    /// All stored entries in key order, with values rendered as text.
    pub fn entries(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries.iter().map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.as_str(), rendered)
        })
    }

    fn persist(&self) -> bool {
        match self.store.save(&self.path, &self.entries) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error saving state file {}: {}", self.path.display(), e);
                false
            }
        }
    }
}
