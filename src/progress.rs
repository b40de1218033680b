use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Live counters for one encode job.
///
/// Written by the pipeline's worker threads, snapshotted by the polling
/// driver. Both counters are monotonically non-decreasing: readers may see
/// a stale prefix but never a regression.
#[derive(Debug, Default)]
pub struct JobProgress {
    done_frames: AtomicU32,
    // f32 bit pattern. Non-negative floats order the same as their bits, so
    // fetch_max keeps the value monotonic under concurrent writers.
    elapsed_bits: AtomicU32,
}

impl JobProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `n` more frames as fully compressed.
    pub fn add_done(&self, n: u32) {
        self.done_frames.fetch_add(n, Ordering::Relaxed);
    }

    pub fn done_frames(&self) -> u32 {
        self.done_frames.load(Ordering::Relaxed)
    }

    /// Record wall-clock seconds since job start. Stale values lose.
    pub fn record_elapsed(&self, seconds: f32) {
        self.elapsed_bits
            .fetch_max(seconds.max(0.0).to_bits(), Ordering::Relaxed);
    }

    pub fn elapsed_seconds(&self) -> f32 {
        f32::from_bits(self.elapsed_bits.load(Ordering::Relaxed))
    }

    /// Rough seconds left for `total_frames`, extrapolated from the observed
    /// frame rate. `None` until at least one frame has completed.
    pub fn estimated_remaining_secs(&self, total_frames: u32) -> Option<f32> {
        let done = self.done_frames();
        let elapsed = self.elapsed_seconds();
        if done == 0 || elapsed <= 0.0 {
            return None;
        }
        let rate = done as f32 / elapsed;
        Some(total_frames.saturating_sub(done) as f32 / rate)
    }
}

/// One-shot cancellation flag shared by the driver, the coordinator and
/// every job it runs.
///
/// Workers only consult the flag at batch boundaries, which bounds
/// cancellation latency to one batch of in-flight work.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
