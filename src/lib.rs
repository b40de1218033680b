#![forbid(unsafe_code)]

mod coordinator;
mod error;
mod format;
mod job;
mod load;
mod pipeline;
mod progress;
mod writer;

pub mod dxt;
pub mod lz4hc;

pub use coordinator::{Coordinator, FinishedJob, JobState, JobStatus};
pub use dxt::Quality;
pub use error::{GvError, GvResult};
pub use format::{
    ADDRESS_ENTRY_SIZE, AddressEntry, GvHeader, RAW_PAYLOAD_AT, VideoFormat, read_address_table,
};
pub use job::{EncodeJob, default_output_path, list_image_dir};
pub use load::{RawFrame, load_rgba};
pub use pipeline::{
    EncodeStats, PipelineOpts, encode_images_to_gv, encode_images_to_gv_with_opts,
};
pub use progress::{CancelFlag, JobProgress};
pub use writer::GvWriter;
