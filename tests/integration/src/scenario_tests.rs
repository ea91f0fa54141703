//! Scenario tests over a library-shaped tree
//!
//! Each scenario drives the batch runner through a sequence of edits the
//! way a user would between scheduled runs, pinning directory times so
//! that every step is deterministic.

use std::fs;
use std::time::Duration;

use dirsync_core::{
    BatchRunner, BatchSummary, CancelFlag, NullObserver, SyncJob, SyncSettings, TimestampStore,
};
use dirsync_test_utils::TestTree;
use pretty_assertions::assert_eq;

const BASE: i64 = 1_600_000_000;

fn run(tree: &TestTree, settings: SyncSettings) -> BatchSummary {
    let job = SyncJob::new("library", tree.source(), tree.target());
    let mut store = TimestampStore::open(tree.state_file());
    BatchRunner::new(settings, &NullObserver, CancelFlag::new()).run(&[job], &mut store)
}

fn library() -> TestTree {
    let tree = TestTree::new();
    tree.write("metadata.db", "v1")
        .write("Author A/Book 1 (1)/book.epub", "one")
        .write("Author A/Book 1 (1)/cover.jpg", "cover one")
        .write("Author B/Book 2 (2)/book.epub", "two");
    tree.pin_source_dirs(BASE);
    tree
}

// ============================================================================
// Library lifecycle
// ============================================================================

#[test]
fn test_library_lifecycle() {
    let tree = library();

    // Initial sync copies everything
    let summary = run(&tree, SyncSettings::default());
    assert!(summary.is_success());
    tree.assert_mirrored("Author A/Book 1 (1)/cover.jpg");
    tree.assert_mirrored("Author B/Book 2 (2)/book.epub");

    // Adding a book touches the book dir and its author dir only
    tree.write("Author A/Book 3 (3)/book.epub", "three");
    tree.set_dir_mtime("Author A/Book 3 (3)", BASE + 10);
    tree.set_dir_mtime("Author A", BASE + 10);
    tree.write("metadata.db", "v2");

    let summary = run(&tree, SyncSettings::default());
    let stats = &summary.reports[0].stats;
    assert_eq!(stats.dirs_changed, 2);
    assert_eq!(stats.files_synced, 2);
    tree.assert_mirrored("Author A/Book 3 (3)/book.epub");
    tree.assert_mirrored("metadata.db");

    // Deleting a book bumps its author dir; reconcile removes the copy
    fs::remove_dir_all(tree.source().join("Author A/Book 1 (1)")).unwrap();
    tree.set_dir_mtime("Author A", BASE + 20);

    let summary = run(&tree, SyncSettings::default());
    let stats = &summary.reports[0].stats;
    assert_eq!(stats.dirs_changed, 1);
    assert_eq!(stats.files_deleted, 2);
    assert_eq!(stats.dirs_deleted, 1);
    tree.assert_target_missing("Author A/Book 1 (1)");
    tree.assert_target_exists("Author A/Book 3 (3)/book.epub");

    // Nothing changed: nothing but root files moves
    let summary = run(&tree, SyncSettings::default());
    assert_eq!(summary.reports[0].stats.dirs_changed, 0);
    assert_eq!(
        TimestampStore::open(tree.state_file())
            .stored("library")
            .map(|ts| ts.timestamp()),
        Some(BASE + 20)
    );
}

#[test]
fn test_in_place_edit_goes_unnoticed() {
    let tree = library();
    run(&tree, SyncSettings::default());

    // Rewriting an existing file leaves its directory's mtime alone
    let book = tree.source().join("Author B/Book 2 (2)/book.epub");
    fs::write(&book, "two, revised").unwrap();
    tree.pin_source_dirs(BASE);

    run(&tree, SyncSettings::default());

    let mirrored = fs::read_to_string(tree.target().join("Author B/Book 2 (2)/book.epub")).unwrap();
    assert_eq!(mirrored, "two");
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_copied() {
    let tree = library();
    std::os::unix::fs::symlink(
        tree.source().join("Author B/Book 2 (2)/book.epub"),
        tree.source().join("Author B/Book 2 (2)/alias.epub"),
    )
    .unwrap();
    tree.pin_source_dirs(BASE);

    let summary = run(&tree, SyncSettings::default());

    assert!(summary.is_success());
    tree.assert_mirrored("Author B/Book 2 (2)/book.epub");
    tree.assert_target_missing("Author B/Book 2 (2)/alias.epub");
}

// ============================================================================
// Pacing
// ============================================================================

#[test]
fn test_pause_between_batches() {
    let tree = library();
    let settings = SyncSettings {
        batch_size: 1,
        batch_pause_ms: 20,
        ..SyncSettings::default()
    };

    let summary = run(&tree, settings);

    // Four directories, a pause between each
    let report = &summary.reports[0];
    assert_eq!(report.stats.dirs_changed, 4);
    assert!(
        Duration::from_millis(report.stats.elapsed_ms) >= Duration::from_millis(60),
        "run took only {}ms",
        report.stats.elapsed_ms
    );
}
