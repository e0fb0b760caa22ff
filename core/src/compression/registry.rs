//! compression/registry.rs
//! Format registry and codec factory functions.

use crate::compression::codecs::{auto, gzip, zlib};
use crate::compression::constants::DEFAULT_LEVEL_DEFLATE;
use crate::compression::types::{CompressionError, CompressionFormat, Compressor, Decompressor};

/// Only gzip is produced on the write side.
pub fn create_compressor(format: CompressionFormat, level: Option<u32>) -> Result<Box<dyn Compressor + Send>, CompressionError> {
    match format {
        CompressionFormat::Gzip => gzip::GzipCompressor::new(level.unwrap_or(DEFAULT_LEVEL_DEFLATE)),
        other => Err(CompressionError::UnsupportedFormat { format_id: other as u16 }),
    }
}

pub fn create_decompressor(format: CompressionFormat) -> Result<Box<dyn Decompressor + Send>, CompressionError> {
    match format {
        CompressionFormat::Auto => auto::AutoDecompressor::new(),
        CompressionFormat::Gzip => gzip::GzipDecompressor::new(),
        CompressionFormat::Zlib => zlib::ZlibDecompressor::new(),
    }
}
