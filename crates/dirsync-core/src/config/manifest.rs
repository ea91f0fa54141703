//! Manifest parsing for the job list
//!
//! A manifest holds the ordered list of sync jobs plus optional tuning
//! settings. TOML, JSON and YAML are accepted; JSON and YAML may also be a
//! bare array of jobs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirsync_fs::{ConfigStore, DefaultPath, RobustnessConfig};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One named source -> target job. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncJob {
    /// Unique key; also the key in the state file
    pub name: String,
    /// Tree to read from
    pub source: PathBuf,
    /// Tree to mirror into
    pub target: PathBuf,
}

impl SyncJob {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Tunables for pacing, checkpointing and retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Persist a checkpoint after this many mirrored directories
    pub checkpoint_interval: usize,
    /// Pause after this many mirrored directories
    pub batch_size: usize,
    /// Length of the pause between batches, in milliseconds
    pub batch_pause_ms: u64,
    /// Time budget for retrying a failed file copy, in milliseconds
    pub copy_retry_ms: u64,
    /// First retry delay, in milliseconds
    pub copy_retry_initial_ms: u64,
    /// Where to keep last-sync timestamps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            checkpoint_interval: 50,
            batch_size: 50,
            batch_pause_ms: 0,
            copy_retry_ms: 0,
            copy_retry_initial_ms: 100,
            state_file: None,
        }
    }
}

impl SyncSettings {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    /// Retry policy for file operations.
    pub fn robustness(&self) -> RobustnessConfig {
        RobustnessConfig::retrying(
            Duration::from_millis(self.copy_retry_ms),
            Duration::from_millis(self.copy_retry_initial_ms),
        )
    }
}

/// Parsed job manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Tuning knobs
    #[serde(default)]
    pub settings: SyncSettings,

    /// Jobs, in execution order
    #[serde(default, rename = "sync")]
    pub jobs: Vec<SyncJob>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestRepr {
    // Must come first: a struct would also accept a sequence
    Bare(Vec<SyncJob>),
    Full(Manifest),
}

impl Manifest {
    /// Parse a manifest from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use dirsync_core::config::Manifest;
    ///
    /// let manifest = Manifest::parse(r#"
    /// [settings]
    /// checkpoint_interval = 10
    ///
    /// [[sync]]
    /// name = "books"
    /// source = "/srv/calibre"
    /// target = "/mnt/nas/calibre"
    /// "#).unwrap();
    ///
    /// assert_eq!(manifest.jobs.len(), 1);
    /// assert_eq!(manifest.settings.checkpoint_interval, 10);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate a manifest file.
    ///
    /// Relative job and state paths are resolved against the manifest's
    /// directory; a leading `~/` expands to the home directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let repr: ManifestRepr = ConfigStore::new().load(path)?;
        let mut manifest = match repr {
            ManifestRepr::Bare(jobs) => Manifest {
                settings: SyncSettings::default(),
                jobs,
            },
            ManifestRepr::Full(manifest) => manifest,
        };

        let base = path.parent().unwrap_or(Path::new("."));
        for job in &mut manifest.jobs {
            job.source = resolve_path(&job.source, base);
            job.target = resolve_path(&job.target, base);
        }
        if let Some(state) = manifest.settings.state_file.take() {
            manifest.settings.state_file = Some(resolve_path(&state, base));
        }

        manifest.validate()?;
        tracing::debug!(
            "Loaded {} job(s) from {}",
            manifest.jobs.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Reject manifests that cannot be run.
    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(Error::InvalidConfig {
                message: "no sync jobs defined".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                return Err(Error::InvalidConfig {
                    message: "job name must not be empty".to_string(),
                });
            }
            if job.source.as_os_str().is_empty() || job.target.as_os_str().is_empty() {
                return Err(Error::InvalidConfig {
                    message: format!("job '{}' needs both source and target", job.name),
                });
            }
            if !seen.insert(job.name.as_str()) {
                return Err(Error::DuplicateJob {
                    name: job.name.clone(),
                });
            }
        }

        if self.settings.checkpoint_interval == 0 {
            return Err(Error::InvalidConfig {
                message: "checkpoint_interval must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Find a job by name.
    pub fn job(&self, name: &str) -> Option<&SyncJob> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Jobs to run: all of them when `names` is empty, otherwise the named
    /// ones in manifest order.
    pub fn select(&self, names: &[String]) -> Result<Vec<SyncJob>> {
        if let Some(unknown) = names.iter().find(|n| self.job(n).is_none()) {
            return Err(Error::UnknownJob {
                name: unknown.clone(),
            });
        }
        Ok(self
            .jobs
            .iter()
            .filter(|j| names.is_empty() || names.contains(&j.name))
            .cloned()
            .collect())
    }

    /// State file location for a manifest loaded from `manifest_path`.
    pub fn state_path(&self, manifest_path: &Path) -> PathBuf {
        match &self.settings.state_file {
            Some(path) => path.clone(),
            None => manifest_path
                .parent()
                .unwrap_or(Path::new("."))
                .join(DefaultPath::StateFile),
        }
    }
}

fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_relative() {
        base.join(expanded)
    } else {
        expanded
    }
}
