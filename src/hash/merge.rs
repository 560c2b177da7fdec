// Manifest merge module
// Additive merge for `add`: listed files are never re-hashed or replaced

use std::collections::HashSet;

use super::manifest::ManifestEntry;
use super::path_utils;

/// Result of merging fresh hashes into an existing manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Existing entries followed by the new ones (sorted among themselves)
    pub entries: Vec<ManifestEntry>,
    pub added: usize,
}

/// Combines existing manifest entries with newly hashed files
pub struct ManifestMergeEngine;

impl ManifestMergeEngine {
    /// Case-folded set of every listed relative path
    pub fn existing_paths(existing: &[ManifestEntry]) -> HashSet<String> {
        existing
            .iter()
            .map(|e| path_utils::fold_case(&e.relative_path))
            .collect()
    }

    /// Candidates not yet listed, in their original order
    ///
    /// Run before hashing so `add` only reads new files.
    pub fn pending_files(existing: &[ManifestEntry], candidates: Vec<String>) -> Vec<String> {
        let mut seen = Self::existing_paths(existing);
        candidates
            .into_iter()
            .filter(|path| seen.insert(path_utils::fold_case(path)))
            .collect()
    }

    /// Append fresh entries whose paths are not listed yet
    ///
    /// Matching is case-insensitive; among duplicate fresh entries the first
    /// one wins.
    pub fn merge(existing: Vec<ManifestEntry>, fresh: Vec<ManifestEntry>) -> MergeOutcome {
        let mut seen = Self::existing_paths(&existing);

        let mut new_entries: Vec<ManifestEntry> = fresh
            .into_iter()
            .filter(|e| seen.insert(path_utils::fold_case(&e.relative_path)))
            .collect();
        new_entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let added = new_entries.len();
        let mut entries = existing;
        entries.extend(new_entries);

        MergeOutcome { entries, added }
    }
}

// Tests in tests/hash/merge_tests.rs
