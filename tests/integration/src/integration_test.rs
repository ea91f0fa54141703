//! End-to-end integration test for the vertical slice
//!
//! This test exercises the complete flow: manifest file -> state file ->
//! batch run -> state file again, using the file shapes older installs
//! already have on disk.

use std::fs;

use chrono::{DateTime, Utc};
use dirsync_core::{
    BatchRunner, CancelFlag, Manifest, RecordingObserver, SyncEvent, SyncOutcome, TimestampStore,
};
use dirsync_test_utils::TestTree;
use pretty_assertions::assert_eq;

const BASE: i64 = 1_600_000_000;

/// A tree with a bare-array `config.json` holding a good and a broken job,
/// plus a legacy state file with naive timestamps and a foreign key.
fn setup_legacy_install() -> (TestTree, std::path::PathBuf) {
    let tree = TestTree::new();
    tree.write("metadata.db", "db")
        .write("Author A/Book (1)/book.epub", "epub one")
        .write("Author B/Book (2)/book.epub", "epub two");
    tree.pin_source_dirs(BASE);

    let config = tree.root().join("config.json");
    let jobs = serde_json::json!([
        { "name": "books", "source": tree.source(), "target": tree.target() },
        { "name": "ghost", "source": tree.root().join("no-such-dir"), "target": tree.root().join("ghost-out") },
    ]);
    fs::write(&config, serde_json::to_string_pretty(&jobs).unwrap()).unwrap();
    fs::write(
        tree.state_file(),
        r#"{"books": "2001-09-09T01:46:40.000000", "unrelated": "keep me"}"#,
    )
    .unwrap();

    (tree, config)
}

#[test]
fn test_full_vertical_slice() {
    let (tree, config) = setup_legacy_install();

    // 1. Load the manifest; the state file defaults to sitting beside it
    let manifest = Manifest::load(&config).unwrap();
    assert_eq!(manifest.jobs.len(), 2);
    assert_eq!(manifest.state_path(&config), tree.state_file());

    // 2. The legacy naive timestamp is understood
    let mut store = TimestampStore::open(manifest.state_path(&config));
    let since = store.get_last_sync("books");
    assert!(since < DateTime::<Utc>::from_timestamp(BASE, 0).unwrap());

    // 3. Run both jobs; the broken one does not stop the good one
    let observer = RecordingObserver::new();
    let summary = BatchRunner::new(manifest.settings.clone(), &observer, CancelFlag::new())
        .run(&manifest.jobs, &mut store);

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert!(matches!(summary.reports[1].outcome, SyncOutcome::Failed { .. }));
    assert_eq!(summary.reports[0].stats.dirs_changed, 4);
    assert_eq!(summary.reports[0].stats.files_synced, 3);

    tree.assert_mirrored("metadata.db");
    tree.assert_mirrored("Author A/Book (1)/book.epub");
    tree.assert_mirrored("Author B/Book (2)/book.epub");

    // 4. The state file is rewritten in the new format, foreign keys kept
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tree.state_file()).unwrap()).unwrap();
    assert_eq!(raw["books"], "2020-09-13T12:26:40Z");
    assert_eq!(raw["unrelated"], "keep me");
    assert!(raw.get("ghost").is_none());

    // 5. Both jobs reported a start and a finish
    let finished = observer.matching(|e| matches!(e, SyncEvent::Finished { .. }));
    assert_eq!(finished.len(), 2);
}

#[test]
fn test_checkpoints_follow_settings() {
    let tree = TestTree::new();
    for i in 1..=6 {
        tree.write(&format!("dir{i}/file.txt"), "x");
    }
    tree.pin_source_dirs(BASE);
    for i in 1..=6 {
        tree.set_dir_mtime(&format!("dir{i}"), BASE + i);
    }
    let manifest_path = tree.write_manifest(
        "books",
        "checkpoint_interval = 2\nbatch_size = 2\nbatch_pause_ms = 1",
    );
    let manifest = Manifest::load(&manifest_path).unwrap();
    let mut store = TimestampStore::open(manifest.state_path(&manifest_path));

    let observer = RecordingObserver::new();
    BatchRunner::new(manifest.settings.clone(), &observer, CancelFlag::new())
        .run(&manifest.jobs, &mut store);

    let checkpoints: Vec<_> = observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SyncEvent::Checkpoint { processed, timestamp, .. } => Some((processed, timestamp.timestamp())),
            _ => None,
        })
        .collect();
    assert_eq!(checkpoints, vec![(2, BASE + 2), (4, BASE + 4)]);
    assert_eq!(
        TimestampStore::open(tree.state_file()).stored("books"),
        DateTime::<Utc>::from_timestamp(BASE + 6, 0)
    );
}
