//! dirsync CLI
//!
//! Mirrors source trees into target trees, one changed directory at a time.

mod cli;
mod commands;
mod context;
mod error;
mod logging;
mod signal;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use dirsync_core::CancelFlag;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns false when the command ran but did not fully succeed.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.config, cli.state),
        None => {
            // No command provided - show help hint
            println!("{} One-way directory mirroring", "dirsync".green().bold());
            println!();
            println!("Run {} for available commands.", "dirsync --help".cyan());
            Ok(true)
        }
    }
}

fn execute_command(cmd: Commands, config: Option<PathBuf>, state: Option<PathBuf>) -> Result<bool> {
    match cmd {
        Commands::Sync { names, json } => {
            let ctx = Context::load(config.as_deref(), state.as_deref())?;
            let cancel = CancelFlag::new();
            signal::install(cancel.clone())?;
            commands::run_sync(&ctx, &names, json, cancel)
        }
        Commands::Status { json } => {
            let ctx = Context::load(config.as_deref(), state.as_deref())?;
            commands::run_status(&ctx, json)?;
            Ok(true)
        }
        Commands::Reset { name } => {
            let ctx = Context::load(config.as_deref(), state.as_deref())?;
            commands::run_reset(&ctx, &name)?;
            Ok(true)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "dirsync", &mut std::io::stdout());
            Ok(true)
        }
    }
}
