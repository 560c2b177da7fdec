// Directory scanning module
// Selects files below the root and records their hashes into a manifest

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

use super::error::HashUtilityError;
use super::events::PipelineObserver;
use super::glob::GlobFilter;
use super::manifest::{ManifestEntry, ManifestStore, ParseMode};
use super::merge::ManifestMergeEngine;
use super::path_utils;
use super::pipeline::{CancellationToken, ChecksumEntry, HashingPipeline, JobMode, PipelineConfig};
use super::summary::FinalSummary;

// Re-export HashUtilityError as ScanError for callers that only scan
pub type ScanError = HashUtilityError;

/// Outcome of a create or add run
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanReport {
    pub summary: FinalSummary,
    /// Entries newly written to the manifest
    pub added: usize,
    /// Entries in the manifest after the run
    pub manifest_entries: usize,
    /// False when there was nothing to hash and the manifest was left alone
    pub manifest_written: bool,
}

impl ScanReport {
    fn unchanged(manifest_entries: usize) -> Self {
        Self {
            summary: super::summary::SummaryAggregator::new().finish(0),
            added: 0,
            manifest_entries,
            manifest_written: false,
        }
    }
}

/// Recursively collect every regular file below `root`
///
/// Unreadable directories are logged and skipped. Symlinks are not followed.
pub fn collect_files(root: &Path, cancel: &CancellationToken) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(HashUtilityError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry_result in WalkDir::new(root)
        .parallelism(jwalk::Parallelism::RayonNewPool(0))
        .skip_hidden(false)
        .follow_links(false)
    {
        cancel.check()?;

        match entry_result {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.path()),
            Ok(_) => {}
            Err(e) => log::warn!("Error walking directory {}: {}", root.display(), e),
        }
    }

    log::debug!("Found {} files below {}", files.len(), root.display());
    Ok(files)
}

/// Engine for creating manifests and adding new files to them
pub struct ScanEngine {
    config: PipelineConfig,
    cancel: CancellationToken,
    parse_mode: ParseMode,
}

impl ScanEngine {
    pub fn new(config: PipelineConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            cancel,
            parse_mode: ParseMode::default(),
        }
    }

    /// How `add` treats malformed lines in the existing manifest
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    /// Relative paths of all files selected by the globs, sorted
    ///
    /// The manifest itself is never selected.
    pub fn select_files(&self, manifest: &Path) -> Result<Vec<String>, ScanError> {
        let root = path_utils::absolute(self.config.root());
        let manifest_key = path_utils::relative_manifest_path(&path_utils::absolute(manifest), &root)
            .map(|rel| path_utils::fold_case(&rel));

        let files = collect_files(&root, &self.cancel)?;
        let filter = GlobFilter::new(self.config.includes(), self.config.excludes());

        let mut selected: Vec<String> = filter
            .filter_files(&files, &root)
            .into_iter()
            .filter(|rel| manifest_key.as_deref() != Some(path_utils::fold_case(rel).as_str()))
            .filter(|rel| {
                let storable = ManifestStore::is_storable_path(rel);
                if !storable {
                    log::warn!("Skipping {:?}: control characters cannot be stored in a manifest", rel);
                }
                storable
            })
            .collect();
        selected.sort();
        Ok(selected)
    }

    /// Hash every selected file and write a new manifest
    ///
    /// Files that fail to hash are reported in the summary and left out of
    /// the manifest. With no files selected nothing is written.
    pub fn create_manifest<O: PipelineObserver>(
        &self,
        manifest: &Path,
        observer: &O,
    ) -> Result<ScanReport, ScanError> {
        let files = self.select_files(manifest)?;
        if files.is_empty() {
            log::warn!("No files selected below {}", self.config.root().display());
            return Ok(ScanReport::unchanged(0));
        }

        log::info!("Creating {} from {} files", manifest.display(), files.len());
        let (summary, recorded) = self.hash_files(files, observer)?;

        let store = ManifestStore::new(manifest);
        store.write_all_entries(&recorded)?;

        Ok(ScanReport {
            summary,
            added: recorded.len(),
            manifest_entries: recorded.len(),
            manifest_written: true,
        })
    }

    /// Hash only the selected files the manifest does not list yet and
    /// append them
    ///
    /// Existing entries are kept as they are. A missing manifest is treated
    /// as empty. With nothing new the manifest is left untouched.
    pub fn add_to_manifest<O: PipelineObserver>(
        &self,
        manifest: &Path,
        observer: &O,
    ) -> Result<ScanReport, ScanError> {
        let store = ManifestStore::new(manifest).with_parse_mode(self.parse_mode);
        let existing = if store.exists() {
            store.read_entries(&self.cancel)?
        } else {
            Vec::new()
        };

        let pending = ManifestMergeEngine::pending_files(&existing, self.select_files(manifest)?);
        if pending.is_empty() {
            log::warn!("No new files to add to {}", manifest.display());
            return Ok(ScanReport::unchanged(existing.len()));
        }

        log::info!("Adding {} new files to {}", pending.len(), manifest.display());
        let (summary, recorded) = self.hash_files(pending, observer)?;

        let merged = ManifestMergeEngine::merge(existing, recorded);
        if merged.added > 0 {
            store.write_all_entries(&merged.entries)?;
        }

        Ok(ScanReport {
            summary,
            added: merged.added,
            manifest_entries: merged.entries.len(),
            manifest_written: merged.added > 0,
        })
    }

    fn hash_files<O: PipelineObserver>(
        &self,
        files: Vec<String>,
        observer: &O,
    ) -> Result<(FinalSummary, Vec<ManifestEntry>), ScanError> {
        let pipeline = HashingPipeline::new(self.config.clone(), self.cancel.clone());
        let outcome = pipeline.run(
            files.into_iter().map(ChecksumEntry::unhashed),
            JobMode::Record,
            observer,
        )?;

        // Never write after a cancel, even if the pipeline already drained
        self.cancel.check()?;
        Ok((outcome.aggregator.finish(outcome.total_files), outcome.recorded))
    }
}

// Tests in tests/hash/scan_tests.rs
