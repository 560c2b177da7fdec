// Verification module
// Checks every manifest entry against the files below the root, then reports
// files on disk that the manifest does not list

use std::collections::HashSet;
use std::path::Path;

use super::error::HashUtilityError;
use super::events::PipelineObserver;
use super::glob::GlobFilter;
use super::manifest::{ManifestStore, ParseMode};
use super::merge::ManifestMergeEngine;
use super::path_utils;
use super::pipeline::{CancellationToken, ChecksumEntry, HashingPipeline, JobMode, PipelineConfig};
use super::scan;
use super::summary::{FinalSummary, SummaryAggregator};

// Re-export HashUtilityError as VerifyError for callers that only verify
pub type VerifyError = HashUtilityError;

/// Engine for verifying file integrity against a manifest
pub struct VerifyEngine {
    config: PipelineConfig,
    parse_mode: ParseMode,
    cancel: CancellationToken,
}

impl VerifyEngine {
    pub fn new(config: PipelineConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            parse_mode: ParseMode::default(),
            cancel,
        }
    }

    /// Fail on malformed manifest lines instead of skipping them
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    /// Verify `manifest` against the configured root
    ///
    /// Manifest entries are checked as listed; the include/exclude globs only
    /// decide which unlisted files on disk are reported.
    ///
    /// # Returns
    /// The run summary, or an error if the manifest cannot be read or the run
    /// was cancelled
    pub fn verify<O: PipelineObserver>(
        &self,
        manifest: &Path,
        observer: &O,
    ) -> Result<FinalSummary, VerifyError> {
        let store = ManifestStore::new(manifest).with_parse_mode(self.parse_mode);
        if !store.exists() {
            return Err(HashUtilityError::ManifestNotFound {
                path: manifest.to_path_buf(),
            });
        }

        let manifest_modified = store.modified()?;
        let entries = store.read_entries(&self.cancel)?;
        let listed = ManifestMergeEngine::existing_paths(&entries);
        log::info!("Verifying {} manifest entries from {}", entries.len(), manifest.display());

        let pipeline = HashingPipeline::new(self.config.clone(), self.cancel.clone());
        let mut outcome = pipeline.run(
            entries.into_iter().map(ChecksumEntry::from),
            JobMode::Verify { manifest_modified },
            observer,
        )?;

        self.reconcile(manifest, &listed, &mut outcome.aggregator, observer)?;

        Ok(outcome.aggregator.finish(outcome.total_files))
    }

    // Walk the root and add a warning for every selected file the manifest
    // does not list. The manifest itself is never reported.
    fn reconcile<O: PipelineObserver>(
        &self,
        manifest: &Path,
        listed: &HashSet<String>,
        aggregator: &mut SummaryAggregator,
        observer: &O,
    ) -> Result<(), VerifyError> {
        let root = path_utils::absolute(self.config.root());
        let manifest_key = path_utils::relative_manifest_path(&path_utils::absolute(manifest), &root)
            .map(|rel| path_utils::fold_case(&rel));

        let files = scan::collect_files(&root, &self.cancel)?;
        let filter = GlobFilter::new(self.config.includes(), self.config.excludes());

        let mut unlisted = 0usize;
        for relative in filter.filter_files(&files, &root) {
            self.cancel.check()?;

            let key = path_utils::fold_case(&relative);
            if listed.contains(&key) || manifest_key.as_deref() == Some(key.as_str()) {
                continue;
            }

            let full_path = path_utils::resolve_manifest_path(&root, &relative);
            observer.unlisted_file_found(&full_path);
            aggregator.record_unlisted(relative, full_path);
            unlisted += 1;
        }

        if unlisted > 0 {
            log::info!("Found {} files not listed in {}", unlisted, manifest.display());
        }
        Ok(())
    }
}

// Tests in tests/hash/verify_tests.rs
