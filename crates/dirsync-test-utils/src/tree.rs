//! [`TestTree`] builder for source/target sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;

/// A scratch directory holding `source/`, `target/`, a state file and an
/// optional manifest, with helpers for setup and assertion.
///
/// Directory mtimes move whenever an entry is written, so tests build the
/// tree first and pin times afterwards.
///
/// # Example
///
/// ```rust,no_run
/// use dirsync_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write("A/one.txt", "1").write("A/two.txt", "2");
/// tree.pin_source_dirs(1_000_000_000);
/// tree.assert_target_missing("A/one.txt");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create the scratch directory with an empty `source/`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("source")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.root().join("source")
    }

    /// Target root. Not created up front; the first sync creates it.
    pub fn target(&self) -> PathBuf {
        self.root().join("target")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root().join("last_sync.json")
    }

    /// Write a source file, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        write_under(&self.source(), relative, content);
        self
    }

    /// Create a source directory (and parents).
    pub fn mkdir(&self, relative: &str) -> &Self {
        fs::create_dir_all(self.source().join(relative)).unwrap();
        self
    }

    /// Delete a source file or directory tree.
    pub fn remove(&self, relative: &str) {
        let path = self.source().join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).unwrap();
        } else {
            fs::remove_file(&path).unwrap();
        }
    }

    /// Write a file straight into the target, bypassing sync.
    pub fn write_target(&self, relative: &str, content: &str) -> &Self {
        write_under(&self.target(), relative, content);
        self
    }

    /// Set one source directory's mtime (and atime) to `unix_seconds`.
    pub fn set_dir_mtime(&self, relative: &str, unix_seconds: i64) {
        let time = FileTime::from_unix_time(unix_seconds, 0);
        filetime::set_file_times(self.source().join(relative), time, time).unwrap();
    }

    /// Pin every source directory, root included, to `unix_seconds`.
    pub fn pin_source_dirs(&self, unix_seconds: i64) {
        let time = FileTime::from_unix_time(unix_seconds, 0);
        pin_dirs(&self.source(), time);
    }

    pub fn source_mtime(&self, relative: &str) -> FileTime {
        mtime(&self.source().join(relative))
    }

    pub fn target_mtime(&self, relative: &str) -> FileTime {
        mtime(&self.target().join(relative))
    }

    /// Write `config.toml` with one job named `name` over this tree, plus
    /// extra `[settings]` lines. Returns the manifest path.
    pub fn write_manifest(&self, name: &str, settings: &str) -> PathBuf {
        let path = self.root().join("config.toml");
        let content = format!(
            "[settings]\nstate_file = '{}'\n{settings}\n\n[[sync]]\nname = \"{name}\"\nsource = '{}'\ntarget = '{}'\n",
            self.state_file().display(),
            self.source().display(),
            self.target().display(),
        );
        fs::write(&path, content).unwrap();
        path
    }

    /// Assert that a source file was copied into the target byte for byte.
    ///
    /// # Panics
    /// Panics with a descriptive message if the copy is missing or differs.
    pub fn assert_mirrored(&self, relative: &str) {
        let source = self.source().join(relative);
        let target = self.target().join(relative);
        let expected = fs::read(&source)
            .unwrap_or_else(|_| panic!("Could not read source file: {}", source.display()));
        let actual = fs::read(&target)
            .unwrap_or_else(|_| panic!("Expected mirrored file: {}", target.display()));
        assert!(
            expected == actual,
            "Mirrored file {} differs from source",
            target.display()
        );
    }

    /// Assert that `relative` exists under the target.
    pub fn assert_target_exists(&self, relative: &str) {
        let path = self.target().join(relative);
        assert!(path.exists(), "Expected to exist: {}", path.display());
    }

    /// Assert that `relative` does **not** exist under the target.
    pub fn assert_target_missing(&self, relative: &str) {
        let path = self.target().join(relative);
        assert!(!path.exists(), "Expected NOT to exist: {}", path.display());
    }
}

fn write_under(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
}

fn pin_dirs(dir: &Path, time: FileTime) {
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        if entry.file_type().unwrap().is_dir() {
            pin_dirs(&entry.path(), time);
        }
    }
    filetime::set_file_times(dir, time, time).unwrap();
}

fn mtime(path: &Path) -> FileTime {
    let metadata = fs::metadata(path)
        .unwrap_or_else(|e| panic!("Could not stat {}: {e}", path.display()));
    FileTime::from_last_modification_time(&metadata)
}
