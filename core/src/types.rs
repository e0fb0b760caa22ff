use std::io;
use thiserror::Error;

use crate::compression::CompressionError;

/// Unified stream error covering I/O, codec, mode and lifecycle failures.
/// - `From<T>` impls enable `?` from the codec and OS layers.
/// - Short reads are not errors; they are reported through the fail bit.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Underlying file open/read/write/close failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Compression/decompression error (bad header, CRC mismatch, truncation).
    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    /// seek / truncate: never supported on a compressed stream.
    #[error("zstream: attempted .{op}() on a stream that does not support it")]
    Unsupported { op: &'static str },

    /// Mode string or mask that cannot be used to open a stream.
    #[error("invalid open mode: {0}")]
    InvalidMode(String),

    #[error("invalid buffer size {size}: must be in 1..={max}")]
    InvalidBufferSize { size: usize, max: usize },

    #[error("stream is already open")]
    AlreadyOpen,

    #[error("stream is not open for reading")]
    NotReadable,

    #[error("stream is not open for writing")]
    NotWritable,

    /// Write attempted after `final_sync()`.
    #[error("compressed stream already finalized")]
    Finalized,

    /// Write attempted after an earlier I/O or codec failure.
    #[error("stream is in failed state")]
    Failed,
}

impl StreamError {
    pub fn unsupported(op: &'static str) -> Self {
        StreamError::Unsupported { op }
    }

    /// Short category name for logs.
    pub fn category(&self) -> &'static str {
        match self {
            StreamError::Io(_) => "io",
            StreamError::Compression(e) => e.category(),
            StreamError::Unsupported { .. } => "unsupported",
            StreamError::InvalidMode(_) => "invalid_mode",
            StreamError::InvalidBufferSize { .. } => "invalid_buffer_size",
            StreamError::AlreadyOpen => "already_open",
            StreamError::NotReadable => "not_readable",
            StreamError::NotWritable => "not_writable",
            StreamError::Finalized => "finalized",
            StreamError::Failed => "failed",
        }
    }
}

/// Lets `ZStream` serve as `std::io::Read` / `Write`.
impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(inner) => inner,
            StreamError::Unsupported { .. } => io::Error::new(io::ErrorKind::Unsupported, e),
            StreamError::Compression(_) => io::Error::new(io::ErrorKind::InvalidData, e),
            other => io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
