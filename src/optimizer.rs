//! High-level [`Optimizer`] API — the primary embedding surface.
//!
//! ```no_run
//! use texbz::config::Options;
//! use texbz::optimizer::{run, Report};
//!
//! match run("title.texb", "title.texb", Options::from_env())? {
//!     Report::Written { old_size, new_size } => println!("{old_size} -> {new_size}"),
//!     other => println!("left as is: {other:?}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! One run moves through `header -> payload -> recompressed -> gate`. The
//! whole input is buffered before the output is opened, so input and output
//! may name the same file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::codec::{Codec, ZopfliZlibCodec};
use crate::config::Options;
use crate::error::{FileError, TexbError};
use crate::header::{ContainerHeader, PREAMBLE_LEN};
use crate::payload;
use crate::rewrite::{ratio_percent, Rewrite, SizeGate};

/// Path that stands for stdin / stdout.
pub const STDIO_PATH: &str = "-";

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What the size gate decided for one container.
#[derive(Debug)]
pub enum Outcome<'a> {
    NoChange { size: u64 },
    Larger   { old_size: u64, new_size: u64 },
    Smaller  { old_size: u64, rewrite: Rewrite<'a> },
}

/// Summary of a file-level [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    NoChange { size: u64 },
    Larger   { old_size: u64, new_size: u64 },
    Written  { old_size: u64, new_size: u64 },
}

// ── Optimizer ─────────────────────────────────────────────────────────────────

pub struct Optimizer<C: Codec = ZopfliZlibCodec> {
    codec:   C,
    options: Options,
}

impl Default for Optimizer {
    fn default() -> Self { Self::new(ZopfliZlibCodec, Options::default()) }
}

impl<C: Codec> Optimizer<C> {
    pub fn new(codec: C, options: Options) -> Self {
        Self { codec, options }
    }

    pub fn options(&self) -> &Options { &self.options }

    /// Parse `input`, recompress its payload and decide whether to replace it.
    pub fn optimize<'a>(&self, input: &'a [u8]) -> Result<Outcome<'a>, TexbError> {
        let mut reader = Cursor::new(input);
        let header = ContainerHeader::read(&mut reader)?;
        debug!(
            width = header.width,
            height = header.height,
            flags = %header.flags,
            entries = header.directory.entries.len(),
            "header parsed"
        );

        let payload = payload::extract(&mut reader, &header, &self.codec)?;
        let old_size = payload.stored_size;

        let packed = self.codec.compress(&payload.raw, self.options.iterations)?;
        drop(payload);
        let new_size = packed.len() as u64;
        debug!(codec = self.codec.name(), iterations = self.options.iterations.get(), new_size, "recompressed");

        Ok(match SizeGate::compare(new_size, old_size) {
            SizeGate::NoChange => Outcome::NoChange { size: old_size },
            SizeGate::Larger   => Outcome::Larger { old_size, new_size },
            SizeGate::Smaller  => {
                let trailer_len = header.trailer_len(old_size)?;
                let start = PREAMBLE_LEN as usize;
                let trailer = usize::try_from(trailer_len)
                    .ok()
                    .and_then(|len| input.get(start..start.checked_add(len)?))
                    .ok_or_else(|| io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("header region of {trailer_len} bytes runs past end of input"),
                    ))?;
                Outcome::Smaller {
                    old_size,
                    rewrite: Rewrite {
                        trailer,
                        payload: packed,
                        flags: header.flags,
                        flags_offset: header.flags_offset,
                    },
                }
            }
        })
    }
}

// ── File-level entry point ────────────────────────────────────────────────────

/// Optimize `input` with the built-in codec and, on improvement only, write
/// the result to `output`. Either path may be `"-"`.
pub fn run<I, O>(input: I, output: O, options: Options) -> Result<Report, FileError>
where
    I: AsRef<Path>,
    O: AsRef<Path>,
{
    run_with(&Optimizer::new(ZopfliZlibCodec, options), input.as_ref(), output.as_ref())
}

pub fn run_with<C: Codec>(optimizer: &Optimizer<C>, input: &Path, output: &Path) -> Result<Report, FileError> {
    let data = read_input(input).map_err(|e| FileError::new(input, e))?;
    info!("File: {}", input.display());

    let outcome = optimizer.optimize(&data).map_err(|e| FileError::new(input, e))?;
    let report = match outcome {
        Outcome::NoChange { size } => {
            info!("No size change detected ({size} bytes)");
            Report::NoChange { size }
        }
        Outcome::Larger { old_size, new_size } => {
            info!(
                "Size is larger: {new_size} bytes (previously {old_size} bytes) ({:.2}%)",
                ratio_percent(new_size, old_size)
            );
            Report::Larger { old_size, new_size }
        }
        Outcome::Smaller { old_size, rewrite } => {
            let new_size = rewrite.payload.len() as u64;
            write_output(output, &rewrite).map_err(|e| FileError::new(output, e))?;
            info!(
                "New size: {new_size} bytes (previously {old_size} bytes) ({:.2}%)",
                ratio_percent(new_size, old_size)
            );
            Report::Written { old_size, new_size }
        }
    };
    Ok(report)
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if is_stdio(path) {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        Ok(data)
    } else {
        std::fs::read(path)
    }
}

fn write_output(path: &Path, rewrite: &Rewrite<'_>) -> io::Result<u64> {
    if is_stdio(path) {
        let bytes = rewrite.to_bytes()?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
        return Ok(bytes.len() as u64);
    }
    let file: File = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    let mut out = BufWriter::new(file);
    let len = rewrite.write_to(&mut out)?;
    out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(len)
}
