use std::path::{Path, PathBuf};

use crate::dxt::Quality;
use crate::error::{GvError, GvResult};
use crate::format::VideoFormat;

/// Extensions the directory scanner accepts (case-insensitive).
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpeg", "jpg", "tiff", "tif"];

/// One unit of encoding work: an ordered image sequence and its output file.
///
/// All images in a job must share the dimensions of the first image; the
/// pipeline fails the job on the first mismatch.
#[derive(Clone, Debug)]
pub struct EncodeJob {
    /// Input frames in playback order.
    pub image_paths: Vec<PathBuf>,
    /// Destination GV file.
    pub output_path: PathBuf,
    /// Playback rate stored in the header; must be positive.
    pub fps: f32,
    pub quality: Quality,
    pub format: VideoFormat,
}

impl EncodeJob {
    /// Build a job from a directory of images. Frames are the directory's
    /// accepted image files in lexicographic order; the output is `<dir>.gv`.
    pub fn from_dir(
        dir: &Path,
        fps: f32,
        quality: Quality,
        format: VideoFormat,
    ) -> GvResult<Self> {
        Ok(Self {
            image_paths: list_image_dir(dir)?,
            output_path: default_output_path(dir),
            fps,
            quality,
            format,
        })
    }

    pub fn validate(&self) -> GvResult<()> {
        if !(self.fps > 0.0) {
            return Err(GvError::validation("job fps must be > 0"));
        }
        Ok(())
    }

    pub fn frame_count(&self) -> u32 {
        self.image_paths.len() as u32
    }
}

/// Default output convention: the input directory path with `.gv` appended.
pub fn default_output_path(dir: &Path) -> PathBuf {
    let mut os = dir.as_os_str().to_os_string();
    os.push(".gv");
    PathBuf::from(os)
}

/// List a directory's image files: accepted extensions only, names starting
/// with '.' skipped, paths sorted lexicographically to define frame order.
pub fn list_image_dir(dir: &Path) -> GvResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| GvError::io(format!("read input directory '{}': {e}", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| GvError::io(format!("scan '{}': {e}", dir.display())))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if IMAGE_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
