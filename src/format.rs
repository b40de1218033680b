use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{GvError, GvResult};

/// Offset of the first payload byte; the fixed header occupies `[0, 0x18)`.
pub const RAW_PAYLOAD_AT: u64 = 0x18;

/// On-disk size of one address-table entry (u64 offset + u64 size).
pub const ADDRESS_ENTRY_SIZE: u64 = 16;

/// GPU texture format of the stored frames.
///
/// Wire values are part of the container contract: 1 = DXT1, 5 = DXT5.
/// 3 is left unassigned for a DXT3 variant this encoder never produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoFormat {
    Dxt1,
    Dxt5,
}

impl VideoFormat {
    /// Alpha content decides the format: DXT5 carries an alpha channel,
    /// DXT1 does not.
    pub fn from_alpha(has_alpha: bool) -> Self {
        if has_alpha {
            Self::Dxt5
        } else {
            Self::Dxt1
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Dxt1 => 1,
            Self::Dxt5 => 5,
        }
    }

    pub fn from_raw(raw: u32) -> GvResult<Self> {
        match raw {
            1 => Ok(Self::Dxt1),
            5 => Ok(Self::Dxt5),
            other => Err(GvError::validation(format!(
                "unknown GV video format {other}"
            ))),
        }
    }

    /// Storage per 4x4 texel block.
    pub fn bytes_per_block(self) -> u32 {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt5 => 16,
        }
    }
}

/// The fixed 0x18-byte GV file header, all fields little-endian.
///
/// `block_size` is derivable from (width, height, format) but is stored
/// explicitly so decoders can allocate decompression buffers without
/// recomputing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GvHeader {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub fps: f32,
    pub format: VideoFormat,
    pub block_size: u32,
}

impl GvHeader {
    pub fn write_to<W: Write>(&self, w: &mut W) -> GvResult<()> {
        let put = |e: std::io::Error| GvError::io(format!("write GV header: {e}"));
        w.write_u32::<LittleEndian>(self.width).map_err(put)?;
        w.write_u32::<LittleEndian>(self.height).map_err(put)?;
        w.write_u32::<LittleEndian>(self.frame_count).map_err(put)?;
        w.write_f32::<LittleEndian>(self.fps).map_err(put)?;
        w.write_u32::<LittleEndian>(self.format.to_raw())
            .map_err(put)?;
        w.write_u32::<LittleEndian>(self.block_size).map_err(put)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> GvResult<Self> {
        let get = |e: std::io::Error| GvError::io(format!("read GV header: {e}"));
        let width = r.read_u32::<LittleEndian>().map_err(get)?;
        let height = r.read_u32::<LittleEndian>().map_err(get)?;
        let frame_count = r.read_u32::<LittleEndian>().map_err(get)?;
        let fps = r.read_f32::<LittleEndian>().map_err(get)?;
        let format = VideoFormat::from_raw(r.read_u32::<LittleEndian>().map_err(get)?)?;
        let block_size = r.read_u32::<LittleEndian>().map_err(get)?;
        Ok(Self {
            width,
            height,
            frame_count,
            fps,
            format,
            block_size,
        })
    }
}

/// Location of one frame's LZ4 payload within the file.
///
/// `offset` is absolute; `size` is the exact LZ4-HC payload length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressEntry {
    pub offset: u64,
    pub size: u64,
}

impl AddressEntry {
    pub fn write_to<W: Write>(&self, w: &mut W) -> GvResult<()> {
        let put = |e: std::io::Error| GvError::io(format!("write GV address entry: {e}"));
        w.write_u64::<LittleEndian>(self.offset).map_err(put)?;
        w.write_u64::<LittleEndian>(self.size).map_err(put)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> GvResult<Self> {
        let get = |e: std::io::Error| GvError::io(format!("read GV address entry: {e}"));
        let offset = r.read_u64::<LittleEndian>().map_err(get)?;
        let size = r.read_u64::<LittleEndian>().map_err(get)?;
        Ok(Self { offset, size })
    }
}

/// Read the address-table trailer: `frame_count` entries ending exactly at
/// EOF. Leaves the reader positioned at EOF.
pub fn read_address_table<R: Read + Seek>(
    r: &mut R,
    frame_count: u32,
) -> GvResult<Vec<AddressEntry>> {
    let table_len = u64::from(frame_count) * ADDRESS_ENTRY_SIZE;
    r.seek(SeekFrom::End(-(table_len as i64)))
        .map_err(|e| GvError::io(format!("seek to GV address table: {e}")))?;
    let mut entries = Vec::with_capacity(frame_count as usize);
    for _ in 0..frame_count {
        entries.push(AddressEntry::read_from(r)?);
    }
    Ok(entries)
}
