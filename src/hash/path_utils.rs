// Path normalization utilities for cross-platform path handling
// Manifest paths always use forward slashes, whatever the host separator is

use std::path::{Component, Path, PathBuf};

/// Normalize a path string to forward slashes
pub fn to_manifest_separators(path_str: &str) -> String {
    path_str.replace('\\', "/")
}

/// Turn a manifest relative path into a host path below `root`
///
/// Both `/` and `\` are accepted in the manifest, so a manifest written on
/// Windows verifies on Unix and the other way around.
pub fn resolve_manifest_path(root: &Path, relative: &str) -> PathBuf {
    let mut full = root.to_path_buf();
    for part in relative.split(['/', '\\']).filter(|p| !p.is_empty() && *p != ".") {
        full.push(part);
    }
    full
}

/// Get the manifest-style relative path of `path` below `root`
///
/// Returns None when `path` is not inside `root`. No filesystem access, so
/// both paths must already be in the same form (both absolute or both relative).
pub fn relative_manifest_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Make a path absolute without touching the filesystem
/// Falls back to the path as given if the current directory is unavailable
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// ASCII/Unicode case-folded key used for case-insensitive path sets
pub fn fold_case(path: &str) -> String {
    to_manifest_separators(path).to_lowercase()
}

// Tests in tests/hash/utility_tests.rs
