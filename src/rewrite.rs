//! Size gate and container rewriter.
//!
//! A recompressed payload replaces the old one only when it is strictly
//! smaller. The rewritten file is
//!
//! ```text
//! "TEXB" | size (patched) | original bytes 8..directory_end | method 0 | payload
//! ```
//!
//! with the size field and the compressed flag patched in place after the
//! body is written.

use std::cmp::Ordering;
use std::io::{self, Cursor, Seek, SeekFrom, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::format::PixelFlags;
use crate::header::{PREAMBLE_LEN, SIZE_FIELD_OFFSET, TEXB_MAGIC};
use crate::payload::METHOD_ZLIB;

/// Result of comparing a new payload size against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeGate {
    NoChange,
    Larger,
    Smaller,
}

impl SizeGate {
    pub fn compare(new_size: u64, old_size: u64) -> Self {
        match new_size.cmp(&old_size) {
            Ordering::Equal   => SizeGate::NoChange,
            Ordering::Greater => SizeGate::Larger,
            Ordering::Less    => SizeGate::Smaller,
        }
    }
}

/// `new / old` as a percentage, for reporting.
pub fn ratio_percent(new_size: u64, old_size: u64) -> f64 {
    new_size as f64 / old_size as f64 * 100.0
}

/// Everything needed to emit the smaller container. Borrows the verbatim
/// region from the fully buffered input.
#[derive(Debug)]
pub struct Rewrite<'a> {
    pub trailer:      &'a [u8],
    pub payload:      Vec<u8>,
    pub flags:        PixelFlags,
    pub flags_offset: u64,
}

impl Rewrite<'_> {
    /// Write the container to an empty `out` positioned at 0, then patch the
    /// header fields. Returns the final length.
    pub fn write_to<W: Write + Seek>(&self, out: &mut W) -> io::Result<u64> {
        out.write_all(TEXB_MAGIC)?;
        out.write_all(&[0; 4])?;
        out.write_all(self.trailer)?;
        out.write_u32::<BigEndian>(METHOD_ZLIB)?;
        out.write_all(&self.payload)?;
        let len = out.stream_position()?;
        out.flush()?;

        let size = u32::try_from(len - PREAMBLE_LEN).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, format!("container of {len} bytes exceeds the size field"))
        })?;
        out.seek(SeekFrom::Start(SIZE_FIELD_OFFSET))?;
        out.write_u32::<BigEndian>(size)?;

        out.seek(SeekFrom::Start(self.flags_offset))?;
        out.write_u16::<BigEndian>(self.flags.with_compressed().bits())?;
        out.seek(SeekFrom::Start(len))?;
        out.flush()?;
        Ok(len)
    }

    /// In-memory rendition, for sinks that cannot seek.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut cur = Cursor::new(Vec::with_capacity(
            PREAMBLE_LEN as usize + self.trailer.len() + 4 + self.payload.len(),
        ));
        self.write_to(&mut cur)?;
        Ok(cur.into_inner())
    }
}
