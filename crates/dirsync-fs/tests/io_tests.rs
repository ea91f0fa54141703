use assert_fs::prelude::*;
use dirsync_fs::{EntryTimes, RobustnessConfig, io};
use filetime::FileTime;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.txt");

    io::write_atomic(&path, b"hello world", RobustnessConfig::default()).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "hello world");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "original").unwrap();

    io::write_atomic(&file_path, b"updated", RobustnessConfig::default()).unwrap();

    let content = fs::read_to_string(&file_path).unwrap();
    assert_eq!(content, "updated");
}

#[test]
fn test_read_text_nonexistent_file() {
    let result = io::read_text(std::path::Path::new("/nonexistent/file.txt"));
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_copy_file_overwrites_and_preserves_mtime() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("source/cover.jpg");
    source.write_binary(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    let target = temp.child("target/cover.jpg");
    target.write_str("stale").unwrap();

    let pinned = FileTime::from_unix_time(1_650_000_000, 0);
    filetime::set_file_mtime(source.path(), pinned).unwrap();

    let bytes = io::copy_file(source.path(), target.path(), RobustnessConfig::default()).unwrap();

    assert_eq!(bytes, 4);
    target.assert(predicate::path::eq_file(source.path()));
    assert_eq!(EntryTimes::read(target.path()).unwrap().modified, pinned);
}

#[test]
fn test_copy_file_missing_source_is_copy_error() {
    let temp = assert_fs::TempDir::new().unwrap();
    let result = io::copy_file(
        &temp.path().join("missing.epub"),
        &temp.path().join("out.epub"),
        RobustnessConfig::default(),
    );

    let err = result.unwrap_err();
    assert!(matches!(err, dirsync_fs::Error::Copy { .. }));
    assert!(err.is_not_found());
    temp.child("out.epub").assert(predicate::path::missing());
}

#[test]
fn test_remove_empty_dir_refuses_non_empty() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("Author/Book/metadata.opf").touch().unwrap();

    let book = temp.child("Author/Book");
    assert!(!io::is_empty_dir(book.path()).unwrap());
    assert!(io::remove_empty_dir(book.path()).is_err());
    book.assert(predicate::path::is_dir());

    io::remove_file(&book.path().join("metadata.opf"), RobustnessConfig::default()).unwrap();
    assert!(io::is_empty_dir(book.path()).unwrap());
    io::remove_empty_dir(book.path()).unwrap();
    book.assert(predicate::path::missing());
}

#[test]
fn test_copy_times_onto_directory() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("src/dir").create_dir_all().unwrap();
    temp.child("dst/dir").create_dir_all().unwrap();

    let pinned = FileTime::from_unix_time(1_500_000_000, 0);
    filetime::set_file_times(temp.child("src/dir").path(), pinned, pinned).unwrap();

    dirsync_fs::copy_times(temp.child("src/dir").path(), temp.child("dst/dir").path()).unwrap();

    let times = EntryTimes::read(temp.child("dst/dir").path()).unwrap();
    assert_eq!(times.modified, pinned);
}
