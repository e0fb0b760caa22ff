//! compression/stream.rs
//! Reader-driven helpers that respect chunk_size discipline, plus one-shot
//! in-memory conversions built on them.
use std::io::Read;

use crate::compression::registry::{create_compressor, create_decompressor};
use crate::compression::types::{CompressionError, CompressionFormat, Compressor, Decompressor};
use crate::constants::MAX_BUFFER_SIZE;

fn check_chunk_size(chunk_size: usize) -> Result<(), CompressionError> {
    if chunk_size == 0 || chunk_size > MAX_BUFFER_SIZE {
        return Err(CompressionError::StateError(format!(
            "chunk size {} outside 1..={}",
            chunk_size, MAX_BUFFER_SIZE
        )));
    }
    Ok(())
}

/// Compress data read from `r` in `chunk_size` blocks, yielding compressed chunks.
/// - Empty chunks (output withheld by the codec) are skipped.
/// - After EOF the compressor is finished once and the tail is yielded.
pub fn compress_stream<R: Read>(
    mut r: R,
    chunk_size: usize,
    mut compressor: Box<dyn Compressor>,
) -> Result<impl Iterator<Item = Result<Vec<u8>, CompressionError>>, CompressionError> {
    check_chunk_size(chunk_size)?;
    let mut buf = vec![0u8; chunk_size];
    let mut done = false;

    Ok(std::iter::from_fn(move || {
        while !done {
            match r.read(&mut buf) {
                Ok(0) => {
                    done = true;
                    let mut out = Vec::new();
                    return Some(compressor.finish(&mut out).map(|_| out));
                }
                Ok(n) => {
                    let mut out = Vec::new();
                    if let Err(e) = compressor.compress_chunk(&buf[..n], &mut out) {
                        done = true;
                        return Some(Err(e));
                    }
                    if !out.is_empty() {
                        return Some(Ok(out));
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    done = true;
                    return Some(Err(CompressionError::StateError(format!("read error: {e}"))));
                }
            }
        }
        None
    }))
}

/// Decompress data read from `r` in `chunk_size` blocks, yielding decoded chunks.
/// The decompressor is finished at EOF, so truncation surfaces as the last item.
/// Bytes decoded before a codec error are yielded ahead of the error.
pub fn decompress_stream<R: Read>(
    mut r: R,
    chunk_size: usize,
    mut decompressor: Box<dyn Decompressor>,
) -> Result<impl Iterator<Item = Result<Vec<u8>, CompressionError>>, CompressionError> {
    check_chunk_size(chunk_size)?;
    let mut buf = vec![0u8; chunk_size];
    let mut done = false;
    let mut deferred: Option<CompressionError> = None;

    Ok(std::iter::from_fn(move || {
        if let Some(e) = deferred.take() {
            return Some(Err(e));
        }
        while !done {
            match r.read(&mut buf) {
                Ok(0) => {
                    done = true;
                    return decompressor.finish().err().map(Err);
                }
                Ok(n) => {
                    let mut out = Vec::new();
                    if let Err(e) = decompressor.decompress_chunk(&buf[..n], &mut out) {
                        done = true;
                        if out.is_empty() {
                            return Some(Err(e));
                        }
                        deferred = Some(e);
                        return Some(Ok(out));
                    }
                    if !out.is_empty() {
                        return Some(Ok(out));
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    done = true;
                    return Some(Err(CompressionError::StateError(format!("read error: {e}"))));
                }
            }
        }
        None
    }))
}

/// gzip-compress a byte slice in one call.
pub fn compress_bytes(data: &[u8], level: Option<u32>) -> Result<Vec<u8>, CompressionError> {
    let compressor = create_compressor(CompressionFormat::Gzip, level)?;
    let mut out = Vec::new();
    for chunk in compress_stream(data, crate::constants::DEFAULT_BUFFER_SIZE, compressor)? {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// Decode a gzip or zlib byte slice in one call.
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let decompressor = create_decompressor(CompressionFormat::Auto)?;
    let mut out = Vec::new();
    for chunk in decompress_stream(data, crate::constants::DEFAULT_BUFFER_SIZE, decompressor)? {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
