//! Payload extraction.
//!
//! Reads the pixel payload that follows the directory. Uncompressed payloads
//! are read as-is; compressed ones carry a 4-byte method code (only 0, zlib,
//! is known) and a stream that runs to the declared end offset.

use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::info;

use crate::codec::Codec;
use crate::error::{FormatError, TexbError};
use crate::header::ContainerHeader;

/// Method code for zlib-framed DEFLATE.
pub const METHOD_ZLIB: u32 = 0;
/// Width of the method-code field.
pub const METHOD_LEN: u64 = 4;

/// Raw pixels plus the size the payload occupied in the source file.
#[derive(Debug)]
pub struct Payload {
    pub raw:         Vec<u8>,
    /// Bytes the stored payload accounts for: declared end minus the
    /// payload start (and minus the method code when compressed).
    pub stored_size: u64,
}

/// Extract the payload. `reader` must be positioned at `header.directory_end`.
pub fn extract<R: Read, C: Codec + ?Sized>(
    reader: &mut R,
    header: &ContainerHeader,
    codec:  &C,
) -> Result<Payload, TexbError> {
    let raw_len = header.raw_payload_len()?;
    let available = header.declared_end() - header.directory_end;

    if !header.is_compressed() {
        info!("TEXB uncompressed, {raw_len} bytes");
        if raw_len as u64 > available {
            return Err(truncated("uncompressed payload", available, raw_len as u64).into());
        }
        let mut raw = Vec::new();
        reader.by_ref().take(raw_len as u64).read_to_end(&mut raw)?;
        if raw.len() != raw_len {
            return Err(truncated("uncompressed payload", raw.len() as u64, raw_len as u64).into());
        }
        return Ok(Payload { raw, stored_size: available });
    }

    let method = reader.read_u32::<BigEndian>()?;
    if method != METHOD_ZLIB {
        return Err(FormatError::UnsupportedCompression(method).into());
    }
    let stored_size = available.checked_sub(METHOD_LEN).ok_or(FormatError::SizeMismatch {
        declared_end:  header.declared_end(),
        payload_start: header.directory_end + METHOD_LEN,
    })?;

    info!("TEXB compressed zlib deflate, {stored_size} bytes -> {raw_len} bytes");
    let mut stream = Vec::new();
    reader.by_ref().take(stored_size).read_to_end(&mut stream)?;
    if (stream.len() as u64) != stored_size {
        return Err(truncated("compressed payload", stream.len() as u64, stored_size).into());
    }

    let raw = codec
        .decompress(&stream, raw_len)
        .map_err(FormatError::DecompressionFailed)?;
    Ok(Payload { raw, stored_size })
}

fn truncated(what: &str, found: u64, wanted: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("{what} truncated: {found} of {wanted} bytes"),
    )
}
