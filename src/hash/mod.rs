// Hash Core Library
// Manifest verification, creation and incremental add over a bounded hashing pipeline

pub mod classify;
pub mod error;
pub mod events;
pub mod glob;
pub mod hash;
pub mod manifest;
pub mod merge;
pub mod path_utils;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod snapshot;
pub mod summary;
pub mod verify;

// Re-export commonly used types for convenience
pub use classify::{classify, Status};
pub use error::HashUtilityError;
pub use events::{ChannelObserver, JobInfo, NoopObserver, PipelineEvent, PipelineObserver};
pub use glob::GlobFilter;
pub use hash::{HashRegistry, Hasher};
pub use manifest::{ManifestEntry, ManifestStore, ParseMode};
pub use merge::{ManifestMergeEngine, MergeOutcome};
pub use pipeline::{
    CancellationToken, ChecksumEntry, HashingPipeline, JobMode, PipelineConfig, PipelineOutcome,
    VerificationJob, VerificationResult,
};
pub use scan::{ScanEngine, ScanReport};
pub use snapshot::PathSnapshotResolver;
pub use summary::{DetailGroup, FinalSummary, Severity, SummaryAggregator};
pub use verify::VerifyEngine;
