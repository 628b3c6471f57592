pub mod format;
pub mod error;
pub mod codec;
pub mod config;
pub mod header;
pub mod payload;
pub mod rewrite;
pub mod optimizer;

#[cfg(test)]
pub(crate) mod test_prelude;

pub use format::PixelFlags;
pub use error::{FileError, FormatError, TexbError};
pub use codec::{Codec, DecoderStatus, ZopfliZlibCodec};
pub use config::Options;
pub use header::{ContainerHeader, DirectoryEntry, SubImageDirectory};
pub use optimizer::{run, Optimizer, Outcome, Report};
