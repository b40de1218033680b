//! Sequential job execution with a polling driver interface.
//!
//! One job runs at a time on a background thread; inside the job the
//! pipeline fans out across the global rayon pool. The driver never blocks:
//! it calls [`Coordinator::poll`] from its own loop and reads progress
//! snapshots in between.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{GvError, GvResult};
use crate::job::EncodeJob;
use crate::pipeline::{self, EncodeStats, PipelineOpts};
use crate::progress::{CancelFlag, JobProgress};

/// Lifecycle of one submitted job.
///
/// Transitions are one-way: `Queued -> Running -> {Done | Failed | Cancelled}`.
/// Terminal states never re-enter `Running`.
#[derive(Clone, Debug)]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed(Arc<GvError>),
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Queued | JobState::Running)
    }
}

/// Driver-facing snapshot of one job.
#[derive(Clone, Debug)]
pub struct JobStatus {
    pub output_path: PathBuf,
    pub total_frames: u32,
    pub done_frames: u32,
    pub elapsed_seconds: f32,
    pub state: JobState,
}

/// Record of a successfully completed job. Failed and cancelled jobs are
/// never listed here.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedJob {
    pub output_path: PathBuf,
    pub elapsed_seconds: f32,
}

struct Slot {
    job: Option<EncodeJob>,
    output_path: PathBuf,
    total_frames: u32,
    progress: Arc<JobProgress>,
    state: JobState,
}

struct Running {
    slot: usize,
    handle: JoinHandle<GvResult<EncodeStats>>,
}

/// Owns the job queue, the shared cancellation flag and the finished list.
pub struct Coordinator {
    opts: PipelineOpts,
    cancel: Arc<CancelFlag>,
    slots: Vec<Slot>,
    next_start: usize,
    running: Option<Running>,
    finished: Vec<FinishedJob>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self::with_opts(PipelineOpts::default())
    }

    pub fn with_opts(opts: PipelineOpts) -> Self {
        Self {
            opts,
            cancel: Arc::new(CancelFlag::new()),
            slots: Vec::new(),
            next_start: 0,
            running: None,
            finished: Vec::new(),
        }
    }

    /// Queue a job. Submissions whose output path is already queued or
    /// running are ignored, so dropping the same input directory twice does
    /// not encode it twice.
    pub fn submit(&mut self, job: EncodeJob) {
        let duplicate = self
            .slots
            .iter()
            .any(|s| !s.state.is_terminal() && s.output_path == job.output_path);
        if duplicate {
            return;
        }

        self.slots.push(Slot {
            output_path: job.output_path.clone(),
            total_frames: job.frame_count(),
            progress: Arc::new(JobProgress::new()),
            state: JobState::Queued,
            job: Some(job),
        });
    }

    /// Non-blocking driver tick: harvests the running job if its thread has
    /// finished and starts the next queued job. Returns `true` while any
    /// work remains.
    pub fn poll(&mut self) -> bool {
        self.harvest();
        self.start_next();
        !self.is_idle()
    }

    /// `true` once the queue has drained and nothing is running.
    pub fn is_idle(&self) -> bool {
        self.running.is_none()
            && self
                .slots
                .iter()
                .all(|s| !matches!(s.state, JobState::Queued))
    }

    /// Set the shared cancellation flag: the running job stops at its next
    /// batch boundary and deletes its partial output; queued jobs never
    /// start. The flag is one-shot: a cancelled coordinator stays
    /// cancelled.
    pub fn request_cancel(&self) {
        self.cancel.set();
    }

    /// The cancellation flag shared with every job this coordinator runs.
    pub fn cancel_flag(&self) -> Arc<CancelFlag> {
        self.cancel.clone()
    }

    /// Snapshot every submitted job, in submission order.
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.slots
            .iter()
            .map(|s| JobStatus {
                output_path: s.output_path.clone(),
                total_frames: s.total_frames,
                done_frames: s.progress.done_frames(),
                elapsed_seconds: s.progress.elapsed_seconds(),
                state: s.state.clone(),
            })
            .collect()
    }

    /// Successfully completed jobs in completion order, which equals
    /// submission order since jobs run strictly sequentially.
    pub fn finished(&self) -> &[FinishedJob] {
        &self.finished
    }

    /// Poll until idle, sleeping `interval` between ticks. Convenience for
    /// drivers without their own loop (and for tests).
    pub fn wait_idle(&mut self, interval: Duration) {
        while self.poll() {
            std::thread::sleep(interval);
        }
    }

    fn harvest(&mut self) {
        let done = self
            .running
            .as_ref()
            .is_some_and(|r| r.handle.is_finished());
        if !done {
            return;
        }
        let Some(Running { slot, handle }) = self.running.take() else {
            return;
        };

        let state = match handle.join() {
            Ok(Ok(stats)) => {
                self.finished.push(FinishedJob {
                    output_path: self.slots[slot].output_path.clone(),
                    elapsed_seconds: stats.elapsed_seconds,
                });
                JobState::Done
            }
            Ok(Err(GvError::Cancelled)) => JobState::Cancelled,
            Ok(Err(e)) => JobState::Failed(Arc::new(e)),
            Err(_) => JobState::Failed(Arc::new(GvError::Other(anyhow::anyhow!(
                "encode worker thread panicked"
            )))),
        };
        self.slots[slot].state = state;
    }

    fn start_next(&mut self) {
        if self.running.is_some() {
            return;
        }
        while self.next_start < self.slots.len() {
            let idx = self.next_start;
            self.next_start += 1;

            if self.cancel.is_set() {
                self.slots[idx].state = JobState::Cancelled;
                self.slots[idx].job = None;
                continue;
            }
            let Some(job) = self.slots[idx].job.take() else {
                continue;
            };

            let progress = self.slots[idx].progress.clone();
            let cancel = self.cancel.clone();
            let opts = self.opts;
            let handle = std::thread::spawn(move || {
                pipeline::encode_images_to_gv_with_opts(&job, opts, &progress, &cancel)
            });
            self.slots[idx].state = JobState::Running;
            self.running = Some(Running { slot: idx, handle });
            return;
        }
    }
}
