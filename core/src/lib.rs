//! zstream-core
//!
//! Pure Rust gzip file streams with independent read/write cursors.
//! No Python, no PyO3, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod openmode;

// Codec layer
pub mod compression;
pub mod telemetry;

// Stream layer
pub mod zstream;
pub mod file;

pub use file::{deflate_file, inflate_file, CopyReport};
pub use openmode::OpenMode;
pub use telemetry::StreamCounters;
pub use types::{Result, StreamError};
pub use zstream::{Capabilities, IoState, StreamState, ZStream, ZStreamConfig};

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{CompressionError, CompressionFormat};
    pub use crate::compression::stream::{compress_bytes, decompress_bytes};
    pub use crate::file::{deflate_file, inflate_file, CopyReport};
    pub use crate::openmode::OpenMode;
    pub use crate::telemetry::StreamCounters;
    pub use crate::types::StreamError;
    pub use crate::zstream::{Capabilities, StreamState, ZStream, ZStreamConfig};
}
