//! TEXB header and sub-image directory.
//!
//! # Layout
//! All integers are big-endian.
//!
//! ```text
//! 0x00  "TEXB"
//! 0x04  u32  total size (file length - 8)
//! 0x08  u16  prefix length, followed by that many opaque bytes
//!       u16  width
//!       u16  height
//!       u16  pixel-format flags
//!       4    reserved
//!       u16  directory entry count
//!       per entry: "TIMG", u16 body length, body
//!       [u32 compression method, if flags bit 3]
//!       payload
//! ```
//!
//! Everything between offset 8 and the end of the directory is carried over
//! verbatim on rewrite; only the size and flags fields are ever patched.

use std::io::{self, Read, Seek};

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{FormatError, TexbError};
use crate::format::PixelFlags;

pub const TEXB_MAGIC: &[u8; 4] = b"TEXB";
pub const TIMG_MAGIC: &[u8; 4] = b"TIMG";

/// Offset of the total-size field.
pub const SIZE_FIELD_OFFSET: u64 = 4;
/// Width of magic + total-size; the size field counts everything after it.
pub const PREAMBLE_LEN: u64 = 8;

/// One "TIMG" directory entry. Only its position and length are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Stream offset of the entry's tag.
    pub offset:   u64,
    pub body_len: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubImageDirectory {
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Raw value of the total-size field.
    pub declared_size: u32,
    pub prefix_len:    u16,
    pub width:         u16,
    pub height:        u16,
    pub flags:         PixelFlags,
    /// Stream offset of the flags field; patched on rewrite.
    pub flags_offset:  u64,
    pub directory:     SubImageDirectory,
    /// Stream offset just past the last directory entry.
    pub directory_end: u64,
}

impl ContainerHeader {
    /// Parse from the start of `reader`, leaving it positioned after the
    /// directory.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, TexbError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != TEXB_MAGIC {
            return Err(FormatError::NotContainer { magic }.into());
        }
        let declared_size = reader.read_u32::<BigEndian>()?;

        let prefix_len = reader.read_u16::<BigEndian>()?;
        skip(reader, prefix_len as u64)?;

        let width = reader.read_u16::<BigEndian>()?;
        let height = reader.read_u16::<BigEndian>()?;
        let flags_offset = reader.stream_position()?;
        let flags = PixelFlags(reader.read_u16::<BigEndian>()?);
        skip(reader, 4)?; // reserved

        let count = reader.read_u16::<BigEndian>()?;
        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            let offset = reader.stream_position()?;
            let mut tag = [0u8; 4];
            reader.read_exact(&mut tag)?;
            if &tag != TIMG_MAGIC {
                return Err(FormatError::InvalidEntry { index, tag }.into());
            }
            let body_len = reader.read_u16::<BigEndian>()?;
            skip(reader, body_len as u64)?;
            entries.push(DirectoryEntry { offset, body_len });
        }
        let directory_end = reader.stream_position()?;

        let header = Self {
            declared_size,
            prefix_len,
            width,
            height,
            flags,
            flags_offset,
            directory: SubImageDirectory { entries },
            directory_end,
        };
        if header.declared_end() < directory_end {
            return Err(FormatError::SizeMismatch {
                declared_end:  header.declared_end(),
                payload_start: directory_end,
            }.into());
        }
        Ok(header)
    }

    /// Offset one past the last byte the size field accounts for.
    #[inline]
    pub fn declared_end(&self) -> u64 {
        self.declared_size as u64 + PREAMBLE_LEN
    }

    #[inline]
    pub fn is_compressed(&self) -> bool { self.flags.is_compressed() }

    /// Raw payload length implied by dimensions and pixel format.
    pub fn raw_payload_len(&self) -> Result<usize, FormatError> {
        self.flags
            .payload_len(self.width, self.height)
            .ok_or(FormatError::UnsupportedPixelFormat(self.flags))
    }

    /// Length of the verbatim region starting at offset 8, derived from the
    /// declared size field and the stored payload size.
    pub fn trailer_len(&self, stored_payload_len: u64) -> Result<u64, FormatError> {
        let method_len = if self.is_compressed() { 4 } else { 0 };
        (self.declared_size as u64)
            .checked_sub(stored_payload_len)
            .and_then(|n| n.checked_sub(method_len))
            .ok_or(FormatError::SizeMismatch {
                declared_end:  self.declared_end(),
                payload_start: self.directory_end,
            })
    }
}

/// Advance `reader` by `n` bytes, failing on a short stream.
fn skip<R: Read>(reader: &mut R, n: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(n), &mut io::sink())?;
    if skipped != n {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("container truncated: wanted {n} bytes, found {skipped}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;
    use std::io::Cursor;

    #[test]
    fn parses_fields_and_offsets() {
        let file = TexbBuilder::new(3, 5, 0xC4)
            .prefix(b"abc")
            .entry(&[1, 2, 3, 4])
            .entry(&[])
            .payload(&[0u8; 60])
            .build();
        let mut cur = Cursor::new(&file[..]);
        let h = ContainerHeader::read(&mut cur).unwrap();

        assert_eq!(h.declared_size as usize, file.len() - 8);
        assert_eq!(h.declared_end(), file.len() as u64);
        assert_eq!((h.width, h.height), (3, 5));
        assert_eq!(h.flags, PixelFlags(0xC4));
        assert_eq!(h.prefix_len, 3);
        // 8 + 2 + 3 + 2 + 2
        assert_eq!(h.flags_offset, 17);
        assert_eq!(h.directory.entries.len(), 2);
        // flags(2) + reserved(4) + count(2)
        assert_eq!(h.directory.entries[0], DirectoryEntry { offset: 25, body_len: 4 });
        assert_eq!(h.directory.entries[1], DirectoryEntry { offset: 35, body_len: 0 });
        assert_eq!(h.directory_end, 41);
        assert_eq!(cur.position(), 41);
        assert_eq!(h.raw_payload_len().unwrap(), 60);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut file = TexbBuilder::new(1, 1, 0).payload(&[0, 0]).build();
        file[..4].copy_from_slice(b"XXXX");
        let err = ContainerHeader::read(&mut Cursor::new(&file[..])).unwrap_err();
        assert!(matches!(
            err,
            TexbError::Format(FormatError::NotContainer { magic }) if &magic == b"XXXX"
        ));
    }

    #[test]
    fn rejects_bad_entry_tag() {
        let file = TexbBuilder::new(1, 1, 0)
            .entry(b"ok")
            .raw_entry(b"TIMX", b"no")
            .payload(&[0, 0])
            .build();
        let err = ContainerHeader::read(&mut Cursor::new(&file[..])).unwrap_err();
        assert!(matches!(
            err,
            TexbError::Format(FormatError::InvalidEntry { index: 1, tag }) if &tag == b"TIMX"
        ));
    }

    #[test]
    fn truncated_directory_is_an_io_error() {
        let mut file = TexbBuilder::new(1, 1, 0).entry(&[9; 32]).build();
        file.truncate(file.len() - 10);
        let err = ContainerHeader::read(&mut Cursor::new(&file[..])).unwrap_err();
        match err {
            TexbError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn declared_size_shorter_than_header() {
        let mut file = TexbBuilder::new(1, 1, 0).payload(&[0, 0]).build();
        file[4..8].copy_from_slice(&4u32.to_be_bytes());
        let err = ContainerHeader::read(&mut Cursor::new(&file[..])).unwrap_err();
        assert!(matches!(err, TexbError::Format(FormatError::SizeMismatch { declared_end: 12, .. })));
    }

    #[test]
    fn trailer_covers_offset_eight_to_directory_end() {
        let file = TexbBuilder::new(2, 2, 0x08).entry(&[5; 7]).method(0).payload(&[1; 20]).build();
        let h = ContainerHeader::read(&mut Cursor::new(&file[..])).unwrap();
        let stored = h.declared_end() - h.directory_end - 4;
        assert_eq!(stored, 20);
        assert_eq!(h.trailer_len(stored).unwrap(), h.directory_end - PREAMBLE_LEN);
    }
}
