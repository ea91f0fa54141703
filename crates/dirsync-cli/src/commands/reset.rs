//! Reset command implementation

use colored::Colorize;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Forget `name`'s last-sync time.
pub fn run_reset(ctx: &Context, name: &str) -> Result<()> {
    if ctx.manifest.job(name).is_none() {
        return Err(dirsync_core::Error::UnknownJob {
            name: name.to_string(),
        }
        .into());
    }

    let mut store = ctx.open_store();
    if !store.entries().any(|(key, _)| key == name) {
        println!("{} has no recorded sync", name.cyan());
        return Ok(());
    }

    if !store.clear_last_sync(name) {
        return Err(CliError::user(format!(
            "Could not write state file {}",
            ctx.state_path.display()
        )));
    }

    println!(
        "{} {} will rescan everything on its next run",
        "OK".green().bold(),
        name.cyan()
    );
    Ok(())
}
