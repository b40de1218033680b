use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{GvError, GvResult};
use crate::format::{AddressEntry, GvHeader, RAW_PAYLOAD_AT};

/// Streaming GV container writer.
///
/// Lifecycle: [`GvWriter::create`] → [`begin`](GvWriter::begin) (exactly
/// once) → [`append_frame`](GvWriter::append_frame) per frame in order →
/// [`finalize`](GvWriter::finalize) or [`abort`](GvWriter::abort).
///
/// Dropping a writer that was neither finalized nor aborted closes and
/// removes the file: a partially written GV file never survives on disk,
/// whichever way the encode ends.
pub struct GvWriter {
    out: Option<BufWriter<File>>,
    path: PathBuf,
    next_offset: u64,
    entries: Vec<AddressEntry>,
    header_written: bool,
}

impl GvWriter {
    pub fn create(path: impl Into<PathBuf>) -> GvResult<Self> {
        let path = path.into();
        let file = File::create(&path)
            .map_err(|e| GvError::io(format!("create '{}': {e}", path.display())))?;
        Ok(Self {
            out: Some(BufWriter::new(file)),
            path,
            next_offset: RAW_PAYLOAD_AT,
            entries: Vec::new(),
            header_written: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the fixed header. Must be called exactly once, before any frame.
    pub fn begin(&mut self, header: &GvHeader) -> GvResult<()> {
        if self.header_written {
            return Err(GvError::validation("GV header already written"));
        }
        header.write_to(self.out_mut()?)?;
        self.header_written = true;
        Ok(())
    }

    /// Append one frame's LZ4 payload and record its address entry.
    pub fn append_frame(&mut self, lz4_bytes: &[u8]) -> GvResult<()> {
        if !self.header_written {
            return Err(GvError::validation("append_frame before GV header"));
        }
        let entry = AddressEntry {
            offset: self.next_offset,
            size: lz4_bytes.len() as u64,
        };
        let path = self.path.clone();
        self.out_mut()?
            .write_all(lz4_bytes)
            .map_err(|e| GvError::io(format!("write frame to '{}': {e}", path.display())))?;
        self.entries.push(entry);
        self.next_offset += lz4_bytes.len() as u64;
        Ok(())
    }

    pub fn frames_written(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Append the address table after the last payload and close the file.
    ///
    /// The table starts at exactly `RAW_PAYLOAD_AT + Σ frame sizes` and holds
    /// one entry per appended frame, in frame order.
    pub fn finalize(mut self) -> GvResult<()> {
        if !self.header_written {
            return Err(GvError::validation("finalize before GV header"));
        }
        let path = self.path.clone();
        let entries = std::mem::take(&mut self.entries);
        let out = self.out_mut()?;
        for entry in &entries {
            entry.write_to(out)?;
        }
        out.flush()
            .map_err(|e| GvError::io(format!("flush '{}': {e}", path.display())))?;
        self.out = None;
        Ok(())
    }

    /// Close the file and remove it. Used on failure and cancellation.
    pub fn abort(mut self) {
        self.discard();
    }

    fn out_mut(&mut self) -> GvResult<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| GvError::validation("GV writer already closed"))
    }

    fn discard(&mut self) {
        if self.out.take().is_none() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove partial GV file"
            );
        }
    }
}

impl Drop for GvWriter {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{self, VideoFormat};

    fn scratch_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gvenc_writer_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn header(frames: u32) -> GvHeader {
        GvHeader {
            width: 4,
            height: 4,
            frame_count: frames,
            fps: 30.0,
            format: VideoFormat::Dxt1,
            block_size: 8,
        }
    }

    #[test]
    fn finalize_lays_out_payloads_then_table() {
        let path = scratch_path("ok.gv");

        let mut w = GvWriter::create(&path).unwrap();
        w.begin(&header(2)).unwrap();
        w.append_frame(&[1, 2, 3]).unwrap();
        w.append_frame(&[4, 5]).unwrap();
        assert_eq!(w.frames_written(), 2);
        w.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, RAW_PAYLOAD_AT + 5 + 2 * 16);
        assert_eq!(&bytes[0x18..0x1D], &[1, 2, 3, 4, 5]);

        let mut cursor = std::io::Cursor::new(&bytes);
        let entries = format::read_address_table(&mut cursor, 2).unwrap();
        assert_eq!(
            entries,
            [
                AddressEntry {
                    offset: RAW_PAYLOAD_AT,
                    size: 3
                },
                AddressEntry {
                    offset: RAW_PAYLOAD_AT + 3,
                    size: 2
                },
            ]
        );
    }

    #[test]
    fn abort_removes_the_file() {
        let path = scratch_path("aborted.gv");

        let mut w = GvWriter::create(&path).unwrap();
        w.begin(&header(10)).unwrap();
        w.append_frame(&[9; 100]).unwrap();
        assert!(path.exists());
        w.abort();
        assert!(!path.exists());
    }

    #[test]
    fn dropping_an_unfinalized_writer_removes_the_file() {
        let path = scratch_path("dropped.gv");
        {
            let mut w = GvWriter::create(&path).unwrap();
            w.begin(&header(1)).unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn finalized_files_survive_drop() {
        let path = scratch_path("kept.gv");
        let mut w = GvWriter::create(&path).unwrap();
        w.begin(&header(0)).unwrap();
        w.finalize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn append_before_begin_is_rejected() {
        let path = scratch_path("misuse.gv");
        let mut w = GvWriter::create(&path).unwrap();
        assert!(matches!(
            w.append_frame(&[0]),
            Err(GvError::Validation(_))
        ));

        w.begin(&header(0)).unwrap();
        assert!(matches!(w.begin(&header(0)), Err(GvError::Validation(_))));
    }
}
