//! Sync command implementation

use colored::Colorize;
use dirsync_core::{BatchRunner, BatchSummary, CancelFlag, SyncOutcome, TracingObserver, format_bytes};

use crate::context::Context;
use crate::error::Result;

/// Run the named jobs (all when `names` is empty).
///
/// Returns whether every selected job completed.
pub fn run_sync(ctx: &Context, names: &[String], json: bool, cancel: CancelFlag) -> Result<bool> {
    let jobs = ctx.manifest.select(names)?;
    let mut store = ctx.open_store();

    tracing::info!("Running {} job(s) from {}", jobs.len(), ctx.manifest_path.display());
    let runner = BatchRunner::new(ctx.manifest.settings.clone(), &TracingObserver, cancel);
    let summary = runner.run(&jobs, &mut store);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(summary.is_success())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    for report in &summary.reports {
        let label = match &report.outcome {
            SyncOutcome::Completed => "OK".green().bold(),
            SyncOutcome::Interrupted => "INTERRUPTED".yellow().bold(),
            SyncOutcome::Failed { .. } => "FAILED".red().bold(),
        };
        println!(
            "{} {}: {} directories, {} files ({}), {} deleted, {} errors in {:.1}s",
            label,
            report.name.cyan(),
            report.stats.dirs_changed,
            report.stats.files_synced,
            format_bytes(report.stats.bytes_synced),
            report.stats.files_deleted + report.stats.dirs_deleted,
            report.stats.errors,
            report.stats.elapsed_ms as f64 / 1000.0
        );
        if let SyncOutcome::Failed { reason } = &report.outcome {
            println!("   {}", reason.dimmed());
        }
    }
    for name in &summary.skipped {
        println!("{} {}", "SKIPPED".dimmed(), name);
    }

    println!();
    println!(
        "{} succeeded, {} failed, {} interrupted",
        summary.succeeded.to_string().green(),
        summary.failed.to_string().red(),
        summary.interrupted.to_string().yellow()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_test_utils::TestTree;

    #[test]
    fn sync_mirrors_and_reports_success() {
        let tree = TestTree::new();
        tree.write("A/one.txt", "1");
        let manifest = tree.write_manifest("books", "");
        let ctx = Context::load(Some(&manifest), None).unwrap();

        let ok = run_sync(&ctx, &[], true, CancelFlag::new()).unwrap();

        assert!(ok);
        tree.assert_mirrored("A/one.txt");
    }

    #[test]
    fn unknown_job_is_an_error() {
        let tree = TestTree::new();
        let manifest = tree.write_manifest("books", "");
        let ctx = Context::load(Some(&manifest), None).unwrap();

        let result = run_sync(&ctx, &["films".to_string()], false, CancelFlag::new());

        assert!(result.is_err());
    }
}
