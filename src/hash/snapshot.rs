// Snapshot path resolution
// Maps paths on a snapshotted volume to the same file inside the snapshot device

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use super::path_utils;

/// Translates original file paths into snapshot device paths
///
/// Built from the `(device path, volume root)` pair returned by whatever
/// created the snapshot (VSS on Windows, an LVM or btrfs snapshot mount
/// elsewhere). Resolution is a pure string transform and never touches the
/// filesystem; an unreadable resolved path surfaces later as a normal read
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSnapshotResolver {
    snapshot_path: PathBuf,
    volume_root: String,
}

impl PathSnapshotResolver {
    /// The volume root is normalized to end with a path separator
    pub fn new(snapshot_path: impl Into<PathBuf>, original_volume_root: impl AsRef<Path>) -> Self {
        let mut volume_root = original_volume_root.as_ref().to_string_lossy().into_owned();
        if !volume_root.ends_with(MAIN_SEPARATOR) && !volume_root.ends_with('/') {
            volume_root.push(MAIN_SEPARATOR);
        }

        Self {
            snapshot_path: snapshot_path.into(),
            volume_root,
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn volume_root(&self) -> &str {
        &self.volume_root
    }

    /// Map `original` into the snapshot
    ///
    /// Relative paths are made absolute first. Paths on another volume come
    /// back absolute but otherwise unchanged.
    pub fn resolve_path(&self, original: &Path) -> PathBuf {
        let full = path_utils::absolute(original);
        let full_str = full.to_string_lossy();

        match self.strip_volume_root(&full_str) {
            Some(remainder) if remainder.is_empty() => self.snapshot_path.clone(),
            Some(remainder) => self.snapshot_path.join(remainder),
            None => full,
        }
    }

    /// Prefix test only, no filesystem access
    pub fn is_on_snapshot_volume(&self, path: &Path) -> bool {
        let full = path_utils::absolute(path);
        self.strip_volume_root(&full.to_string_lossy()).is_some()
    }

    // Case-insensitive prefix strip; a path equal to the root without its
    // trailing separator counts as the root itself
    fn strip_volume_root<'a>(&self, full: &'a str) -> Option<&'a str> {
        let root = self.volume_root.as_str();
        let root_bare = &root[..root.len() - 1];

        if full.len() >= root.len()
            && full.is_char_boundary(root.len())
            && full[..root.len()].eq_ignore_ascii_case(root)
        {
            return Some(&full[root.len()..]);
        }
        if full.eq_ignore_ascii_case(root_bare) {
            return Some("");
        }
        None
    }
}

// Tests in tests/hash/snapshot_tests.rs
