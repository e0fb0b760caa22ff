//! compression/types.rs
//! Codec traits, format enum and the codec error type.
use std::fmt;
use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::compression::constants::format_ids;

/// Stream formats understood by the registry.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum CompressionFormat {
    /// Detect gzip or zlib from the first bytes (read side only).
    Auto = format_ids::AUTO,
    Gzip = format_ids::GZIP,
    Zlib = format_ids::ZLIB,
}

impl CompressionFormat {
    pub fn name(&self) -> &'static str {
        match self {
            CompressionFormat::Auto => "auto",
            CompressionFormat::Gzip => "gzip",
            CompressionFormat::Zlib => "zlib",
        }
    }

    /// Guess the format from the leading bytes of a compressed stream.
    /// Returns `None` until at least two bytes are available.
    pub fn sniff(lead: &[u8]) -> Option<Result<CompressionFormat, CompressionError>> {
        if lead.len() < 2 {
            return None;
        }
        let (b0, b1) = (lead[0], lead[1]);
        if [b0, b1] == crate::compression::constants::gzip::MAGIC {
            return Some(Ok(CompressionFormat::Gzip));
        }
        // zlib: CM=8 in the low nibble, window <= 32K, FCHECK makes CMF*256+FLG a multiple of 31
        let cmf_flg = (u16::from(b0) << 8) | u16::from(b1);
        if b0 & 0x0f == 8 && (b0 >> 4) <= 7 && cmf_flg % 31 == 0 {
            return Some(Ok(CompressionFormat::Zlib));
        }
        Some(Err(CompressionError::InvalidHeader {
            format: "auto",
            msg: format!("unrecognised magic 0x{:02x}{:02x}", b0, b1),
        }))
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

fn format_name(raw: &u16) -> String {
    enum_name_or_hex::<CompressionFormat>(*raw)
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("unsupported format: {}", format_name(.format_id))]
    UnsupportedFormat { format_id: u16 },

    #[error("codec {codec} init failed: {msg}")]
    CodecInitFailed { codec: &'static str, msg: String },

    #[error("codec {codec} process failed: {msg}")]
    CodecProcessFailed { codec: &'static str, msg: String },

    #[error("invalid {format} header: {msg}")]
    InvalidHeader { format: &'static str, msg: String },

    #[error("{format} checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { format: &'static str, expected: u32, actual: u32 },

    #[error("{format} length mismatch: trailer says {expected}, decoded {actual} (mod 2^32)")]
    LengthMismatch { format: &'static str, expected: u32, actual: u32 },

    #[error("{format} stream truncated: {msg}")]
    Truncated { format: &'static str, msg: String },

    #[error("compression state error: {0}")]
    StateError(String),
}

impl CompressionError {
    /// Short category name for logs.
    pub fn category(&self) -> &'static str {
        match self {
            CompressionError::UnsupportedFormat { .. } => "unsupported_format",
            CompressionError::CodecInitFailed { .. } => "codec_init",
            CompressionError::CodecProcessFailed { .. } => "codec_process",
            CompressionError::InvalidHeader { .. } => "invalid_header",
            CompressionError::ChecksumMismatch { .. } => "checksum_mismatch",
            CompressionError::LengthMismatch { .. } => "length_mismatch",
            CompressionError::Truncated { .. } => "truncated",
            CompressionError::StateError(_) => "state",
        }
    }
}

// Require Send so a stream owning a boxed codec can move between threads.
pub trait Compressor: Send {
    /// Feed uncompressed input; append whatever compressed bytes the codec
    /// releases to `out`. The codec may withhold output pending more input.
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError>;
    /// End the stream: flush withheld state and append the trailer.
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), CompressionError>;
    /// Uncompressed bytes accepted so far.
    fn total_in(&self) -> u64;
    /// Compressed bytes produced so far (framing included).
    fn total_out(&self) -> u64;
}

pub trait Decompressor: Send {
    /// Feed compressed input; append at most `max_out` decoded bytes to `out`.
    ///
    /// Returns how many input bytes were consumed. Unconsumed input must be
    /// offered again; an empty `input` drains output the codec still holds.
    /// Bytes appended before an error stay in `out`.
    fn decompress_bounded(&mut self, input: &[u8], out: &mut Vec<u8>, max_out: usize) -> Result<usize, CompressionError>;

    /// Feed all of `input`; append every decoded byte to `out`.
    fn decompress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        let mut rest = input;
        while !rest.is_empty() {
            let used = self.decompress_bounded(rest, out, usize::MAX)?;
            if used == 0 {
                return Err(CompressionError::StateError("decoder accepted no input".into()));
            }
            rest = &rest[used..];
        }
        Ok(())
    }

    /// Called once the compressed source is exhausted. Fails unless the
    /// stream ended on a complete member.
    fn finish(&mut self) -> Result<(), CompressionError>;
    /// Compressed bytes consumed so far.
    fn total_in(&self) -> u64;
    /// Decoded bytes produced so far.
    fn total_out(&self) -> u64;
}
