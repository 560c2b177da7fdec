//! Include/exclude glob filtering for file selection.
//!
//! Patterns are matched case-insensitively against forward-slash relative
//! paths. `*` and `?` stay inside one path segment, `**` crosses segments, and
//! a pattern that names a directory also selects everything below it.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::path_utils;

/// Default include pattern when none is given.
pub const INCLUDE_ALL: &str = "**/*";

/// Split a semicolon-delimited glob list.
///
/// Entries are trimmed and empties dropped. A blank or absent value means
/// "everything" for includes and "nothing" for excludes.
pub fn normalize_globs(raw: Option<&str>, is_exclude: bool) -> Vec<String> {
    let raw = raw.unwrap_or_default();
    if raw.trim().is_empty() {
        return if is_exclude {
            Vec::new()
        } else {
            vec![INCLUDE_ALL.to_string()]
        };
    }

    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One-shot match of a relative path against include/exclude lists.
///
/// Compiles the patterns on every call; use [`GlobFilter`] for bulk work.
pub fn is_match<I, E>(relative_path: &str, includes: &[I], excludes: &[E]) -> bool
where
    I: AsRef<str>,
    E: AsRef<str>,
{
    GlobFilter::new(includes, excludes).matches(relative_path)
}

/// Relative-path and filter a bulk file listing in one pass.
pub fn filter_files<P, I, E>(paths: &[P], root: &Path, includes: &[I], excludes: &[E]) -> Vec<String>
where
    P: AsRef<Path>,
    I: AsRef<str>,
    E: AsRef<str>,
{
    GlobFilter::new(includes, excludes).filter_files(paths, root)
}

/// Compiled include/exclude pattern sets.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    includes: GlobSet,
    excludes: GlobSet,
    /// No include patterns were given, so every path is included.
    include_all: bool,
}

impl Default for GlobFilter {
    fn default() -> Self {
        Self {
            includes: GlobSet::empty(),
            excludes: GlobSet::empty(),
            include_all: true,
        }
    }
}

impl GlobFilter {
    /// Compile include and exclude lists.
    ///
    /// Malformed patterns are dropped with a debug log: they match nothing,
    /// which fails closed for includes and leaves the other patterns working.
    pub fn new<I, E>(includes: &[I], excludes: &[E]) -> Self
    where
        I: AsRef<str>,
        E: AsRef<str>,
    {
        Self {
            includes: build_set(includes),
            excludes: build_set(excludes),
            include_all: includes.iter().all(|p| p.as_ref().trim().is_empty()),
        }
    }

    /// Check a forward- or back-slash relative path.
    pub fn matches(&self, relative_path: &str) -> bool {
        let normalized = path_utils::to_manifest_separators(relative_path);
        let normalized = normalized.trim_start_matches("./");

        let included = self.include_all || matches_path_or_ancestor(&self.includes, normalized);
        included && !matches_path_or_ancestor(&self.excludes, normalized)
    }

    /// Relative-path every file below `root` and keep the matching ones.
    /// Paths outside `root` are skipped.
    pub fn filter_files<P: AsRef<Path>>(&self, paths: &[P], root: &Path) -> Vec<String> {
        paths
            .iter()
            .filter_map(|p| path_utils::relative_manifest_path(p.as_ref(), root))
            .filter(|rel| self.matches(rel))
            .collect()
    }
}

fn build_set<S: AsRef<str>>(patterns: &[S]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let pattern = path_utils::to_manifest_separators(pattern.as_ref().trim());
        let pattern = pattern.trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }

        match GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
        {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => log::debug!("Ignoring invalid glob pattern '{}': {}", pattern, e),
        }
    }

    builder.build().unwrap_or_else(|e| {
        log::debug!("Failed to build glob set: {}", e);
        GlobSet::empty()
    })
}

// A pattern naming a directory ("logs", "build/out") selects everything below it
fn matches_path_or_ancestor(set: &GlobSet, path: &str) -> bool {
    if set.is_empty() {
        return false;
    }
    if set.is_match(path) {
        return true;
    }

    path.match_indices('/')
        .any(|(idx, _)| set.is_match(&path[..idx]))
}
