use std::path::Path;

use crate::error::{GvError, GvResult};

/// One decoded input image: tightly packed RGBA8, row-major.
///
/// Sources without an alpha channel are widened to alpha = 255. Frames are
/// ephemeral; the pipeline drops them as soon as the block compressor has
/// consumed the pixels.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode an image file into RGBA8 pixels.
///
/// Format is sniffed from the file contents, so any container the `image`
/// crate understands works; the directory scanner restricts inputs to
/// png/jpeg/jpg/tiff/tif before paths get here.
pub fn load_rgba(path: &Path) -> GvResult<RawFrame> {
    let img = image::open(path)
        .map_err(|e| GvError::decode(format!("'{}': {e}", path.display())))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(RawFrame {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}
