//! Per-frame LZ4 HC compression.
//!
//! Every frame is compressed as one independent raw LZ4 block: no shared
//! dictionary, no streaming state, no size prefix. Decoders learn each
//! payload's length from the container's address table and the decompressed
//! length from the header's `block_size`.

use lz4::block::{self, CompressionMode};

use crate::error::{GvError, GvResult};

/// Default HC compression level (LZ4HC_CLEVEL_DEFAULT).
const HC_LEVEL: i32 = 9;

/// Worst-case compressed size for a payload of `len` bytes.
pub fn compress_bound(len: usize) -> GvResult<usize> {
    block::compress_bound(len).map_err(|e| GvError::io(format!("lz4 bound for {len} bytes: {e}")))
}

/// Compress `src` into `dst`, returning the number of bytes written.
///
/// `dst` must hold at least `compress_bound(src.len())` bytes.
pub fn compress_into(src: &[u8], dst: &mut [u8]) -> GvResult<usize> {
    block::compress_to_buffer(src, Some(CompressionMode::HIGHCOMPRESSION(HC_LEVEL)), false, dst)
        .map_err(|e| GvError::io(format!("lz4hc compress: {e}")))
}

/// Decompress one raw LZ4 block; `dst.len()` must equal the original
/// uncompressed length.
pub fn decompress_into(src: &[u8], dst: &mut [u8]) -> GvResult<usize> {
    block::decompress_to_buffer(src, Some(dst.len() as i32), dst)
        .map_err(|e| GvError::io(format!("lz4 decompress: {e}")))
}
