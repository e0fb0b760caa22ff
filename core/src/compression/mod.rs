//! compression/mod.rs
//! Streaming gzip/zlib codecs behind the `Compressor` / `Decompressor` traits.
//!
//! Notes:
//! - Codecs are incremental: input may be split at any byte boundary.
//! - The write side emits standard gzip members (header, raw deflate, CRC32 + ISIZE).
//! - The read side verifies every trailer and reports corruption as a distinct error.
//! - Registry maps formats to codec implementations.

pub mod constants;
pub mod types;
pub mod header;
pub mod registry;
pub mod codecs;
pub mod stream;

pub use constants::*;
pub use types::*;
pub use header::*;
pub use registry::*;
