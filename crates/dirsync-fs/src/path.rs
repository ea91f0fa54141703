//! Normalized path rendering for logs, events and JSON output

use std::path::Path;

use serde::{Serialize, Serializer};

/// A path rendered with forward slashes.
///
/// This is a display form only. It is lossy (non-UTF-8 bytes become U+FFFD,
/// backslashes become separators), so filesystem access always goes through
/// the original `Path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Render any path-like input.
    ///
    /// Converts backslashes to forward slashes, collapses repeated
    /// separators and drops `.` segments. A leading `//` (network share)
    /// is preserved.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Check if this appears to be a network path.
    ///
    /// Detects UNC paths (//server/share or \\server\share) and URL-style
    /// mounts. Directory mtimes on these are not always trustworthy.
    pub fn is_network_path(&self) -> bool {
        self.inner.starts_with("//")
            || self.inner.starts_with("smb:/")
            || self.inner.starts_with("nfs:/")
    }
}

fn clean(raw: &str) -> String {
    let network = raw.starts_with("//") && !raw.starts_with("///");
    let absolute = raw.starts_with('/');

    let segments: Vec<&str> = raw
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let body = segments.join("/");

    if network {
        format!("//{body}")
    } else if absolute {
        format!("/{body}")
    } else {
        body
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.inner.is_empty() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

impl Serialize for NormalizedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}
