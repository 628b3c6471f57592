//! Compression services used by the optimizer.
//!
//! The container only ever carries zlib-framed DEFLATE, so there is a single
//! built-in codec: `flate2` inflates the stored payload and Zopfli produces
//! the replacement. The [`Codec`] trait exists so the optimizer can be driven
//! by other encoders (and by deterministic stubs in tests).

use std::io;
use std::num::NonZeroU64;

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

// ── Decoder status ───────────────────────────────────────────────────────────

/// zlib `Z_DATA_ERROR`.
pub const Z_DATA_ERROR: i32 = -3;
/// zlib `Z_BUF_ERROR`.
pub const Z_BUF_ERROR:  i32 = -5;

/// First allocation, and minimum growth step, of the inflate buffer.
const OUTPUT_CHUNK: usize = 64 * 1024;

/// Why an inflate call did not complete. Codes follow zlib's numbering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecoderStatus {
    #[error("buffer error")]
    BufError,
    #[error("data error: {0}")]
    DataError(String),
    #[error("buffer error: produced {produced} of {expected} bytes")]
    ShortOutput { produced: usize, expected: usize },
}

impl DecoderStatus {
    pub fn code(&self) -> i32 {
        match self {
            DecoderStatus::DataError(_) => Z_DATA_ERROR,
            DecoderStatus::BufError | DecoderStatus::ShortOutput { .. } => Z_BUF_ERROR,
        }
    }
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec {
    fn name(&self) -> &'static str;

    /// Inflate a zlib stream into exactly `expected_size` bytes.
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, DecoderStatus>;

    /// Produce a zlib stream for `data`. Deterministic for fixed inputs.
    fn compress(&self, data: &[u8], iterations: NonZeroU64) -> io::Result<Vec<u8>>;
}

impl<C: Codec + ?Sized> Codec for &C {
    fn name(&self) -> &'static str { (**self).name() }
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, DecoderStatus> {
        (**self).decompress(data, expected_size)
    }
    fn compress(&self, data: &[u8], iterations: NonZeroU64) -> io::Result<Vec<u8>> {
        (**self).compress(data, iterations)
    }
}

// ── Built-in codec ───────────────────────────────────────────────────────────

/// flate2 for inflating, Zopfli (zlib framing) for deflating.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZopfliZlibCodec;

impl Codec for ZopfliZlibCodec {
    fn name(&self) -> &'static str { "zopfli-zlib" }

    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, DecoderStatus> {
        let mut inflater = Decompress::new(true);
        // Grows with what the stream yields; header dimensions alone never size it.
        let mut out = Vec::with_capacity(expected_size.min(OUTPUT_CHUNK));
        while out.len() < expected_size {
            if out.len() == out.capacity() {
                let room = expected_size - out.len();
                out.reserve_exact(room.min(out.len().max(OUTPUT_CHUNK)));
            }
            let (in_before, out_before) = (inflater.total_in(), inflater.total_out());
            let status = inflater
                .decompress_vec(&data[in_before as usize..], &mut out, FlushDecompress::None)
                .map_err(|e| DecoderStatus::DataError(e.to_string()))?;
            let progressed = inflater.total_in() != in_before || inflater.total_out() != out_before;
            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError if progressed => {}
                Status::Ok | Status::BufError if out.is_empty() => return Err(DecoderStatus::BufError),
                Status::Ok | Status::BufError => break,
            }
        }
        // Trailing stream data past the image is ignored, as zlib would with a full buffer.
        out.truncate(expected_size);
        if out.len() != expected_size {
            return Err(DecoderStatus::ShortOutput { produced: out.len(), expected: expected_size });
        }
        Ok(out)
    }

    fn compress(&self, data: &[u8], iterations: NonZeroU64) -> io::Result<Vec<u8>> {
        let mut options = zopfli::Options::default();
        options.iteration_count = iterations;
        let mut out = Vec::new();
        zopfli::compress(options, zopfli::Format::Zlib, data, &mut out)?;
        Ok(out)
    }
}
