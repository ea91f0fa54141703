//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// dirsync - One-way directory mirroring with resumable change detection
#[derive(Parser, Debug)]
#[command(name = "dirsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Job manifest (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "DIRSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file, overriding the manifest's `state_file`
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also append log output to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Mirror changed directories for all (or the named) jobs
    ///
    /// Press Ctrl+C once to stop after the current directory with progress
    /// saved; press it again to abort immediately.
    ///
    /// Examples:
    ///   dirsync sync                 # Run every job in the manifest
    ///   dirsync sync calibre photos  # Run two jobs
    ///   dirsync sync --json          # Machine-readable summary on stdout
    Sync {
        /// Job names to run (default: all)
        names: Vec<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show each job and when it last synced
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Forget a job's last-sync time so the next run rescans everything
    Reset {
        /// Job name
        name: String,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   dirsync completions bash > ~/.local/share/bash-completion/completions/dirsync
    ///   dirsync completions zsh > ~/.zfunc/_dirsync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
