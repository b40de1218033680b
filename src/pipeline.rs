//! The encode pipeline: batched, data-parallel frame compression feeding a
//! strictly ordered container writer.
//!
//! Frames are consumed in input order, `batch_size` at a time. Within a
//! batch every frame is loaded, DXT-compressed and LZ4-compressed in
//! parallel on the global rayon pool, each worker writing into its own
//! disjoint scratch slot. Only once the whole batch has materialized are
//! its payloads handed to the writer, in frame order, so output order never
//! depends on worker completion order.

use std::time::Instant;

use rayon::prelude::*;

use crate::dxt;
use crate::error::{GvError, GvResult};
use crate::format::GvHeader;
use crate::job::EncodeJob;
use crate::load::load_rgba;
use crate::lz4hc;
use crate::progress::{CancelFlag, JobProgress};
use crate::writer::GvWriter;

/// Pipeline tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct PipelineOpts {
    /// Frames compressed in parallel per batch. Scratch memory scales
    /// linearly with this: one block-size slot plus one LZ4-bound slot per
    /// frame in flight.
    pub batch_size: usize,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

/// Result of a completed encode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EncodeStats {
    pub frames: u32,
    pub elapsed_seconds: f32,
}

/// Encode a job with default options. See [`encode_images_to_gv_with_opts`].
pub fn encode_images_to_gv(
    job: &EncodeJob,
    progress: &JobProgress,
    cancel: &CancelFlag,
) -> GvResult<EncodeStats> {
    encode_images_to_gv_with_opts(job, PipelineOpts::default(), progress, cancel)
}

/// Encode `job.image_paths` into a GV file at `job.output_path`.
///
/// An empty input list is a silent no-op: no file is produced and no
/// progress is reported. Any frame failure (unreadable image, dimension
/// mismatch) or a cancellation observed at a batch boundary deletes the
/// partial output before returning.
#[tracing::instrument(
    skip(job, opts, progress, cancel),
    fields(output = %job.output_path.display(), frames = job.image_paths.len())
)]
pub fn encode_images_to_gv_with_opts(
    job: &EncodeJob,
    opts: PipelineOpts,
    progress: &JobProgress,
    cancel: &CancelFlag,
) -> GvResult<EncodeStats> {
    job.validate()?;
    if job.image_paths.is_empty() {
        return Ok(EncodeStats::default());
    }

    let start = Instant::now();

    // The first image is authoritative for the whole job's frame size.
    let first = load_rgba(&job.image_paths[0])?;
    let (width, height) = (first.width, first.height);
    drop(first);
    if width == 0 || height == 0 {
        return Err(GvError::validation("input frames must be non-empty"));
    }

    let block_size = dxt::block_size(width, height, job.format) as usize;
    let bound = lz4hc::compress_bound(block_size)?;
    let batch = opts.batch_size.max(1);
    let total = job.image_paths.len();

    let mut writer = GvWriter::create(&job.output_path)?;
    writer.begin(&GvHeader {
        width,
        height,
        frame_count: total as u32,
        fps: job.fps,
        format: job.format,
        block_size: block_size as u32,
    })?;

    // Reused across batches; each worker owns the slot at its batch-local
    // frame index, so the parallel section needs no synchronization.
    let mut gpu_scratch = vec![0u8; batch * block_size];
    let mut lz4_scratch = vec![0u8; batch * bound];
    let mut lz4_sizes = vec![0u32; batch];

    let mut index = 0usize;
    while index < total {
        let work = (total - index).min(batch);
        compress_batch(BatchCtx {
            job,
            width,
            height,
            block_size,
            bound,
            first_frame: index,
            progress,
            start,
            gpu_scratch: &mut gpu_scratch[..work * block_size],
            lz4_scratch: &mut lz4_scratch[..work * bound],
            lz4_sizes: &mut lz4_sizes[..work],
        })?;

        for i in 0..work {
            let len = lz4_sizes[i] as usize;
            writer.append_frame(&lz4_scratch[i * bound..i * bound + len])?;
        }
        index += work;
        progress.record_elapsed(start.elapsed().as_secs_f32());

        if cancel.is_set() {
            writer.abort();
            return Err(GvError::Cancelled);
        }
    }

    writer.finalize()?;
    let elapsed = start.elapsed().as_secs_f32();
    progress.record_elapsed(elapsed);
    Ok(EncodeStats {
        frames: total as u32,
        elapsed_seconds: elapsed,
    })
}

struct BatchCtx<'a> {
    job: &'a EncodeJob,
    width: u32,
    height: u32,
    block_size: usize,
    bound: usize,
    first_frame: usize,
    progress: &'a JobProgress,
    start: Instant,
    gpu_scratch: &'a mut [u8],
    lz4_scratch: &'a mut [u8],
    lz4_sizes: &'a mut [u32],
}

/// Compress one batch in parallel. The first worker error aborts the batch;
/// already-running frames drain before this returns.
fn compress_batch(ctx: BatchCtx<'_>) -> GvResult<()> {
    let BatchCtx {
        job,
        width,
        height,
        block_size,
        bound,
        first_frame,
        progress,
        start,
        gpu_scratch,
        lz4_scratch,
        lz4_sizes,
    } = ctx;

    gpu_scratch
        .par_chunks_mut(block_size)
        .zip(lz4_scratch.par_chunks_mut(bound))
        .zip(lz4_sizes.par_iter_mut())
        .enumerate()
        .try_for_each(|(i, ((gpu_slot, lz4_slot), lz4_len))| -> GvResult<()> {
            let path = &job.image_paths[first_frame + i];
            let frame = load_rgba(path)?;
            if (frame.width, frame.height) != (width, height) {
                return Err(GvError::DimensionMismatch {
                    path: path.clone(),
                    expected_w: width,
                    expected_h: height,
                    actual_w: frame.width,
                    actual_h: frame.height,
                });
            }

            dxt::compress_into(&frame.rgba, width, height, job.quality, job.format, gpu_slot);
            *lz4_len = lz4hc::compress_into(gpu_slot, lz4_slot)? as u32;

            progress.add_done(1);
            progress.record_elapsed(start.elapsed().as_secs_f32());
            Ok(())
        })
}
