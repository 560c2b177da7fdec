//! Progress notifications emitted by the hashing pipeline.
//!
//! Workers call the observer synchronously, so implementations must return
//! quickly. UIs that need a single thread should use [`ChannelObserver`] and
//! drain the receiver on that thread.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::{Path, PathBuf};

use super::pipeline::{ChecksumEntry, VerificationResult};

/// What a worker knows about the job it just picked up.
#[derive(Debug, Clone, Copy)]
pub struct JobInfo<'a> {
    pub entry: &'a ChecksumEntry,
    /// Path on the original volume (before snapshot resolution).
    pub full_path: &'a Path,
    /// `None` when the producer could not stat the file.
    pub file_size: Option<u64>,
}

/// Receives per-file notifications from the pipeline.
///
/// `Context` is an opaque per-job value: whatever `file_started` returns is
/// handed back to `file_progress` and `file_completed` for the same job, and
/// the pipeline never looks inside it. A progress UI can use it to carry its
/// own row handle.
pub trait PipelineObserver: Sync {
    type Context;

    fn file_started(&self, job: &JobInfo<'_>) -> Self::Context;

    fn file_progress(&self, _ctx: &mut Self::Context, _job: &JobInfo<'_>, _bytes_read: u64) {}

    fn file_completed(&self, _ctx: Self::Context, _result: &VerificationResult) {}

    fn unlisted_file_found(&self, _path: &Path) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    type Context = ();

    fn file_started(&self, _job: &JobInfo<'_>) {}
}

/// Owned form of a pipeline notification.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    FileStarted {
        relative_path: String,
        full_path: PathBuf,
        file_size: Option<u64>,
    },
    FileProgress {
        relative_path: String,
        bytes_read: u64,
        file_size: Option<u64>,
    },
    FileCompleted(VerificationResult),
    UnlistedFileFound(PathBuf),
}

/// Forwards every notification into an unbounded channel.
///
/// Sends never block a worker; a dropped receiver just discards events.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<PipelineEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, Receiver<PipelineEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl PipelineObserver for ChannelObserver {
    type Context = ();

    fn file_started(&self, job: &JobInfo<'_>) {
        let _ = self.sender.send(PipelineEvent::FileStarted {
            relative_path: job.entry.relative_path.clone(),
            full_path: job.full_path.to_path_buf(),
            file_size: job.file_size,
        });
    }

    fn file_progress(&self, _ctx: &mut (), job: &JobInfo<'_>, bytes_read: u64) {
        let _ = self.sender.send(PipelineEvent::FileProgress {
            relative_path: job.entry.relative_path.clone(),
            bytes_read,
            file_size: job.file_size,
        });
    }

    fn file_completed(&self, _ctx: (), result: &VerificationResult) {
        let _ = self.sender.send(PipelineEvent::FileCompleted(result.clone()));
    }

    fn unlisted_file_found(&self, path: &Path) {
        let _ = self.sender.send(PipelineEvent::UnlistedFileFound(path.to_path_buf()));
    }
}
