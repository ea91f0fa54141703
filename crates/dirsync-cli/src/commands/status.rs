//! Status command implementation

use std::path::Path;

use chrono::Local;
use colored::Colorize;
use dirsync_core::format_timestamp;
use serde::Serialize;

use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct JobStatus<'a> {
    name: &'a str,
    source: &'a Path,
    target: &'a Path,
    /// RFC 3339, absent when the job never synced
    last_sync: Option<String>,
}

/// Run the status command
pub fn run_status(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.open_store();
    let jobs: Vec<_> = ctx
        .manifest
        .jobs
        .iter()
        .map(|job| JobStatus {
            name: &job.name,
            source: &job.source,
            target: &job.target,
            last_sync: store.stored(&job.name).map(format_timestamp),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    println!("{}", "Sync Status".bold());
    println!();
    println!("{}:   {}", "Config".dimmed(), ctx.manifest_path.display());
    println!("{}:    {}", "State".dimmed(), ctx.state_path.display());
    println!();

    for (job, status) in ctx.manifest.jobs.iter().zip(&jobs) {
        let last = match store.stored(&job.name) {
            Some(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .green(),
            None => "never".yellow(),
        };
        println!("  {} {} (last sync: {})", "+".green(), status.name.cyan(), last);
        println!(
            "    {} -> {}",
            status.source.display().to_string().dimmed(),
            status.target.display().to_string().dimmed()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_test_utils::TestTree;

    #[test]
    fn status_works_before_first_sync() {
        let tree = TestTree::new();
        let manifest = tree.write_manifest("books", "");
        let ctx = Context::load(Some(&manifest), None).unwrap();

        assert!(run_status(&ctx, false).is_ok());
        assert!(run_status(&ctx, true).is_ok());
    }
}
