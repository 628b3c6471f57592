use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::codec::DecoderStatus;
use crate::format::PixelFlags;

/// Exit status used for every structural error.
pub const FORMAT_EXIT_CODE: i32 = -1;

/// The container is structurally unusable. None of these are retried.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Not a TEXB file (magic {})", hex::encode(.magic))]
    NotContainer { magic: [u8; 4] },

    #[error("Invalid TEXB file: directory entry {index} has tag {}", hex::encode(.tag))]
    InvalidEntry { index: u16, tag: [u8; 4] },

    #[error("Unknown compression method {0}")]
    UnsupportedCompression(u32),

    #[error("zLib error: {0}")]
    DecompressionFailed(DecoderStatus),

    #[error("Declared end offset {declared_end} lies before payload start {payload_start}")]
    SizeMismatch { declared_end: u64, payload_start: u64 },

    #[error("Unsupported pixel format flags {0}")]
    UnsupportedPixelFormat(PixelFlags),
}

#[derive(Error, Debug)]
pub enum TexbError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl TexbError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TexbError::Io(e) => e.raw_os_error().unwrap_or(1),
            TexbError::Format(FormatError::DecompressionFailed(status)) => status.code(),
            TexbError::Format(_) => FORMAT_EXIT_CODE,
        }
    }
}

/// A [`TexbError`] tagged with the file it concerns.
#[derive(Error, Debug)]
#[error("{}: {source}", .path.display())]
pub struct FileError {
    pub path:   PathBuf,
    #[source]
    pub source: TexbError,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<TexbError>) -> Self {
        Self { path: path.into(), source: source.into() }
    }

    pub fn exit_code(&self) -> i32 { self.source.exit_code() }
}
