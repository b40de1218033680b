//! DXT1/DXT5 block compression on top of `texpresso`.
//!
//! Output size is fully determined by (width, height, format): one 8- or
//! 16-byte block per 4x4 texel tile, with partial tiles padded internally
//! by the compressor. Compression is deterministic for identical inputs.

use texpresso::{Algorithm, COLOUR_WEIGHTS_PERCEPTUAL, COLOUR_WEIGHTS_UNIFORM, Params};

use crate::format::VideoFormat;

/// Colour quantization effort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// Iterative cluster fit: best quality, slow.
    Full,
    /// Range fit with a uniform colour metric: fast preview-grade output.
    Lite,
}

impl Quality {
    fn params(self) -> Params {
        match self {
            Quality::Full => Params {
                algorithm: Algorithm::IterativeClusterFit,
                weights: COLOUR_WEIGHTS_PERCEPTUAL,
                weigh_colour_by_alpha: false,
            },
            Quality::Lite => Params {
                algorithm: Algorithm::RangeFit,
                weights: COLOUR_WEIGHTS_UNIFORM,
                weigh_colour_by_alpha: false,
            },
        }
    }
}

fn texture_format(format: VideoFormat) -> texpresso::Format {
    match format {
        VideoFormat::Dxt1 => texpresso::Format::Bc1,
        VideoFormat::Dxt5 => texpresso::Format::Bc3,
    }
}

/// Bytes required to store one full frame after block compression.
pub fn block_size(width: u32, height: u32, format: VideoFormat) -> u32 {
    texture_format(format).compressed_size(width as usize, height as usize) as u32
}

/// Block-compress one RGBA8 frame into `out`.
///
/// `rgba` must hold `width * height * 4` bytes and `out` exactly
/// `block_size(width, height, format)` bytes.
pub fn compress_into(
    rgba: &[u8],
    width: u32,
    height: u32,
    quality: Quality,
    format: VideoFormat,
    out: &mut [u8],
) {
    texture_format(format).compress(rgba, width as usize, height as usize, quality.params(), out);
}

/// Decompress one block-compressed frame back into RGBA8.
///
/// `out` must hold `width * height * 4` bytes.
pub fn decompress_into(data: &[u8], width: u32, height: u32, format: VideoFormat, out: &mut [u8]) {
    texture_format(format).decompress(data, width as usize, height as usize, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_matches_dxt_storage_rules() {
        // One 4x4 tile.
        assert_eq!(block_size(4, 4, VideoFormat::Dxt1), 8);
        assert_eq!(block_size(4, 4, VideoFormat::Dxt5), 16);
        // 8x4 is two tiles.
        assert_eq!(block_size(8, 4, VideoFormat::Dxt5), 32);
        // 8x8 is four tiles.
        assert_eq!(block_size(8, 8, VideoFormat::Dxt5), 64);
        // Partial tiles round up: 5x5 occupies 2x2 tiles.
        assert_eq!(block_size(5, 5, VideoFormat::Dxt1), 4 * 8);
        // A typical HD frame.
        assert_eq!(block_size(1920, 1080, VideoFormat::Dxt5), 480 * 270 * 16);
    }

    #[test]
    fn solid_colour_survives_lite_dxt1_exactly() {
        let rgba: Vec<u8> = std::iter::repeat([255u8, 0, 0, 255])
            .take(16)
            .flatten()
            .collect();

        let mut block = vec![0u8; block_size(4, 4, VideoFormat::Dxt1) as usize];
        compress_into(&rgba, 4, 4, Quality::Lite, VideoFormat::Dxt1, &mut block);

        let mut back = vec![0u8; 4 * 4 * 4];
        decompress_into(&block, 4, 4, VideoFormat::Dxt1, &mut back);
        assert_eq!(back, rgba);
    }

    #[test]
    fn dxt5_preserves_alpha_within_tolerance() {
        let mut rgba = Vec::with_capacity(8 * 8 * 4);
        for y in 0..8u32 {
            for x in 0..8u32 {
                rgba.extend_from_slice(&[128, 64, 200, (x * 32 + y) as u8]);
            }
        }

        let mut blocks = vec![0u8; block_size(8, 8, VideoFormat::Dxt5) as usize];
        compress_into(&rgba, 8, 8, Quality::Full, VideoFormat::Dxt5, &mut blocks);

        let mut back = vec![0u8; 8 * 8 * 4];
        decompress_into(&blocks, 8, 8, VideoFormat::Dxt5, &mut back);
        for (orig, dec) in rgba.chunks_exact(4).zip(back.chunks_exact(4)) {
            let alpha_err = (i16::from(orig[3]) - i16::from(dec[3])).unsigned_abs();
            assert!(alpha_err <= 16, "alpha error {alpha_err} too large");
        }
    }

    #[test]
    fn compression_is_deterministic() {
        let rgba: Vec<u8> = (0..16 * 16 * 4).map(|i| (i * 7 % 251) as u8).collect();

        let mut a = vec![0u8; block_size(16, 16, VideoFormat::Dxt1) as usize];
        let mut b = a.clone();
        compress_into(&rgba, 16, 16, Quality::Lite, VideoFormat::Dxt1, &mut a);
        compress_into(&rgba, 16, 16, Quality::Lite, VideoFormat::Dxt1, &mut b);
        assert_eq!(a, b);
    }
}
