// Hashing pipeline module
// One producer stats jobs into a bounded channel, N workers hash them, and the
// calling thread aggregates results until every worker has finished

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::SystemTime;

use super::classify::{classify, Status};
use super::error::HashUtilityError;
use super::events::{JobInfo, PipelineObserver};
use super::hash::{buffer_size_for, bytes_to_hex, HashRegistry, Hasher, LARGE_BUFFER_SIZE};
use super::manifest::ManifestEntry;
use super::path_utils;
use super::snapshot::PathSnapshotResolver;
use super::summary::SummaryAggregator;

pub const DETAIL_FILE_NOT_FOUND: &str = "File not found.";
pub const DETAIL_MISMATCH_NEWER: &str = "Checksum mismatch (file is newer).";
pub const DETAIL_MISMATCH: &str = "Checksum mismatch.";
pub const DETAIL_MISSING_EXPECTED: &str = "No expected hash in manifest.";

/// Shared stop flag for a run
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been cancelled
    pub fn check(&self) -> Result<(), HashUtilityError> {
        if self.is_cancelled() {
            Err(HashUtilityError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Job payload: what the file should hash to and where it lives below the root
///
/// `expected_hash` is empty for create/add jobs and for unlisted files found
/// during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChecksumEntry {
    pub expected_hash: String,
    pub relative_path: String,
}

impl ChecksumEntry {
    pub fn new(expected_hash: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            expected_hash: expected_hash.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Entry for a file that has no recorded hash yet
    pub fn unhashed(relative_path: impl Into<String>) -> Self {
        Self::new(String::new(), relative_path)
    }
}

impl From<ManifestEntry> for ChecksumEntry {
    fn from(entry: ManifestEntry) -> Self {
        Self {
            expected_hash: entry.hash,
            relative_path: entry.relative_path,
        }
    }
}

/// A job as the producer hands it to the workers
#[derive(Debug, Clone)]
pub struct VerificationJob {
    pub entry: ChecksumEntry,
    /// `None` when the stat failed or the path is not a regular file
    pub file_size: Option<u64>,
}

/// Outcome of one job, created once and never changed
#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationResult {
    pub entry: ChecksumEntry,
    pub status: Status,
    /// `None` when the file could not be opened or read
    pub actual_hash: Option<String>,
    pub details: Option<String>,
    pub full_path: Option<PathBuf>,
    /// Bytes hashed for this file (0 unless it was read to the end)
    #[serde(skip)]
    pub bytes_read: u64,
}

impl VerificationResult {
    pub fn new(entry: ChecksumEntry, status: Status) -> Self {
        Self {
            entry,
            status,
            actual_hash: None,
            details: None,
            full_path: None,
            bytes_read: 0,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_full_path(mut self, full_path: impl Into<PathBuf>) -> Self {
        self.full_path = Some(full_path.into());
        self
    }

    pub fn with_actual_hash(mut self, actual_hash: impl Into<String>, bytes_read: u64) -> Self {
        self.actual_hash = Some(actual_hash.into());
        self.bytes_read = bytes_read;
        self
    }

    /// Path for display: the full path when known, else the manifest path
    pub fn display_path(&self) -> String {
        match &self.full_path {
            Some(p) => p.display().to_string(),
            None => self.entry.relative_path.clone(),
        }
    }
}

/// What workers do with a hashed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// Compare against the expected hash; mismatches on files written after
    /// `manifest_modified` are warnings instead of errors
    Verify { manifest_modified: SystemTime },
    /// Keep the computed hash for a new manifest (create/add)
    Record,
}

/// Validated per-run settings, read-only to the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    algorithm: &'static str,
    root: PathBuf,
    includes: Vec<String>,
    excludes: Vec<String>,
    parallelism: usize,
    resolver: Option<Arc<PathSnapshotResolver>>,
}

impl PipelineConfig {
    /// Fails with `UnsupportedAlgorithm` for unknown algorithm names
    pub fn new(root: impl Into<PathBuf>, algorithm: &str) -> Result<Self, HashUtilityError> {
        let algorithm = HashRegistry::canonical_name(algorithm).ok_or_else(|| {
            HashUtilityError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            }
        })?;

        Ok(Self {
            algorithm,
            root: root.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
            parallelism: num_cpus::get().max(1),
            resolver: None,
        })
    }

    /// Zero is treated as one worker
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_globs(mut self, includes: Vec<String>, excludes: Vec<String>) -> Self {
        self.includes = includes;
        self.excludes = excludes;
        self
    }

    pub fn with_snapshot_resolver(mut self, resolver: PathSnapshotResolver) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn resolver(&self) -> Option<&PathSnapshotResolver> {
        self.resolver.as_deref()
    }

    /// Path the bytes are actually read from (inside the snapshot if one is set)
    pub fn effective_path(&self, full_path: &Path) -> PathBuf {
        match &self.resolver {
            Some(resolver) => resolver.resolve_path(full_path),
            None => full_path.to_path_buf(),
        }
    }
}

/// Everything a finished run hands back before engine-specific post-processing
#[derive(Debug)]
pub struct PipelineOutcome {
    pub aggregator: SummaryAggregator,
    /// Number of jobs the producer dispatched
    pub total_files: usize,
    /// Successfully hashed files, only filled in `JobMode::Record`
    pub recorded: Vec<ManifestEntry>,
}

/// Bounded producer/worker pipeline shared by verify, create and add
pub struct HashingPipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl HashingPipeline {
    pub fn new(config: PipelineConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Maximum number of jobs buffered between producer and workers
    pub fn queue_capacity(&self) -> usize {
        self.config.parallelism * 2
    }

    /// Run every entry of `source` through the workers
    ///
    /// Per-file failures end up in the aggregator; only cancellation fails the
    /// run. Result order is unspecified.
    pub fn run<I, O>(&self, source: I, mode: JobMode, observer: &O) -> Result<PipelineOutcome, HashUtilityError>
    where
        I: IntoIterator<Item = ChecksumEntry>,
        I::IntoIter: Send,
        O: PipelineObserver,
    {
        self.cancel.check()?;

        let hashers = (0..self.config.parallelism)
            .map(|_| HashRegistry::get_hasher(self.config.algorithm))
            .collect::<Result<Vec<_>, _>>()?;

        let (job_tx, job_rx) = bounded::<VerificationJob>(self.queue_capacity());
        let (result_tx, result_rx) = unbounded::<VerificationResult>();

        let mut aggregator = SummaryAggregator::new();
        let mut recorded = Vec::new();
        let source = source.into_iter();

        log::info!(
            "Hashing with {} using {} workers (queue capacity {})",
            self.config.algorithm,
            self.config.parallelism,
            self.queue_capacity()
        );

        let total_files = thread::scope(|scope| {
            let producer = scope.spawn(move || self.produce(source, job_tx));

            for hasher in hashers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || self.work(hasher, jobs, results, mode, observer));
            }
            // Only workers may hold the ends now, so the channels close when they exit
            drop(job_rx);
            drop(result_tx);

            for result in result_rx.iter() {
                if self.cancel.is_cancelled() {
                    break;
                }
                if mode == JobMode::Record && result.status == Status::Success {
                    if let Some(hash) = &result.actual_hash {
                        recorded.push(ManifestEntry::new(hash.clone(), result.entry.relative_path.clone()));
                    }
                }
                aggregator.record(result);
            }

            producer.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        });

        self.cancel.check()?;
        log::info!("Pipeline finished: {} jobs dispatched", total_files);

        Ok(PipelineOutcome {
            aggregator,
            total_files,
            recorded,
        })
    }

    // Stats every entry once, in input order; blocks when the queue is full
    fn produce<S>(&self, source: S, jobs: Sender<VerificationJob>) -> usize
    where
        S: Iterator<Item = ChecksumEntry>,
    {
        let mut dispatched = 0;

        for entry in source {
            if self.cancel.is_cancelled() {
                break;
            }

            let full_path = path_utils::resolve_manifest_path(&self.config.root, &entry.relative_path);
            let file_size = fs::metadata(self.config.effective_path(&full_path))
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len());

            if jobs.send(VerificationJob { entry, file_size }).is_err() {
                // All workers are gone (cancelled)
                break;
            }
            dispatched += 1;
        }

        dispatched
    }

    fn work<O: PipelineObserver>(
        &self,
        mut hasher: Box<dyn Hasher>,
        jobs: Receiver<VerificationJob>,
        results: Sender<VerificationResult>,
        mode: JobMode,
        observer: &O,
    ) {
        let mut buffers = ReadBuffers::default();

        for job in jobs.iter() {
            if self.cancel.is_cancelled() {
                break;
            }

            let Some(result) = self.process(&job, hasher.as_mut(), &mut buffers, mode, observer) else {
                break;
            };
            if results.send(result).is_err() {
                break;
            }
        }
    }

    // None means the run was cancelled mid-file
    fn process<O: PipelineObserver>(
        &self,
        job: &VerificationJob,
        hasher: &mut dyn Hasher,
        buffers: &mut ReadBuffers,
        mode: JobMode,
        observer: &O,
    ) -> Option<VerificationResult> {
        let full_path = path_utils::resolve_manifest_path(&self.config.root, &job.entry.relative_path);
        let info = JobInfo {
            entry: &job.entry,
            full_path: &full_path,
            file_size: job.file_size,
        };
        let mut ctx = observer.file_started(&info);

        let result = match job.file_size {
            None => VerificationResult::new(job.entry.clone(), Status::Error)
                .with_details(DETAIL_FILE_NOT_FOUND)
                .with_full_path(&full_path),
            Some(size) => {
                let effective = self.config.effective_path(&full_path);
                match self.hash_file(&effective, size, hasher, buffers, |read| {
                    observer.file_progress(&mut ctx, &info, read)
                }) {
                    Ok(Some((hash, read))) => self.finish_hashed(job, &full_path, &effective, hash, read, mode),
                    Ok(None) => return None,
                    Err(e) => {
                        log::warn!("Cannot read {}: {}", effective.display(), e);
                        VerificationResult::new(job.entry.clone(), Status::Warning)
                            .with_details(format!("Cannot read file: {}", e))
                            .with_full_path(&full_path)
                    }
                }
            }
        };

        observer.file_completed(ctx, &result);
        Some(result)
    }

    // Ok(None) on cancellation; the hasher is always left reset
    fn hash_file(
        &self,
        path: &Path,
        file_size: u64,
        hasher: &mut dyn Hasher,
        buffers: &mut ReadBuffers,
        mut on_progress: impl FnMut(u64),
    ) -> std::io::Result<Option<(String, u64)>> {
        let mut file = File::open(path)?;
        let buffer = buffers.for_size(file_size);
        let mut total = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                hasher.finalize_reset();
                return Ok(None);
            }

            let n = match file.read(buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    hasher.finalize_reset();
                    return Err(e);
                }
            };

            hasher.update(&buffer[..n]);
            total += n as u64;
            on_progress(total);
        }

        Ok(Some((bytes_to_hex(&hasher.finalize_reset()), total)))
    }

    fn finish_hashed(
        &self,
        job: &VerificationJob,
        full_path: &Path,
        effective: &Path,
        hash: String,
        bytes_read: u64,
        mode: JobMode,
    ) -> VerificationResult {
        let base = |status| {
            VerificationResult::new(job.entry.clone(), status)
                .with_full_path(full_path)
                .with_actual_hash(hash.clone(), bytes_read)
        };

        match mode {
            JobMode::Record => base(Status::Success),
            JobMode::Verify { manifest_modified } => {
                let file_modified = fs::metadata(effective)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                let status = classify(
                    Some(&job.entry.expected_hash),
                    Some(&hash),
                    file_modified,
                    manifest_modified,
                );

                match status {
                    Status::Success => base(status),
                    Status::Warning => base(status).with_details(DETAIL_MISMATCH_NEWER),
                    Status::Error if job.entry.expected_hash.trim().is_empty() => {
                        base(status).with_details(DETAIL_MISSING_EXPECTED)
                    }
                    Status::Error => base(status).with_details(DETAIL_MISMATCH),
                }
            }
        }
    }
}

/// Per-worker read buffers, one per size tier, each allocated on first use
#[derive(Default)]
struct ReadBuffers {
    small: Vec<u8>,
    large: Vec<u8>,
}

impl ReadBuffers {
    fn for_size(&mut self, file_size: u64) -> &mut [u8] {
        let size = buffer_size_for(file_size);
        let buffer = if size == LARGE_BUFFER_SIZE {
            &mut self.large
        } else {
            &mut self.small
        };
        if buffer.is_empty() {
            *buffer = vec![0; size];
        }
        buffer
    }
}
