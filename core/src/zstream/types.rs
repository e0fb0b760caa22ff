//! zstream/types.rs
//! Status bits, capability tags and configuration for `ZStream`.
use std::fmt;

use crate::compression::constants::{DEFAULT_LEVEL_DEFLATE, MAX_LEVEL_DEFLATE};
use crate::constants::{DECODE_BUDGET_FACTOR, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::openmode::OpenMode;
use crate::types::StreamError;

bitflags::bitflags! {
    /// Sticky status bits of an open stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IoState: u8 {
        const EOF  = 0b01;
        const FAIL = 0b10;
    }
}

bitflags::bitflags! {
    /// What an open stream can do, derived from its open mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u8 {
        const READABLE      = 0b001;
        const WRITABLE      = 0b010;
        /// Text input: `read_line` / `read_lines` yield text lines.
        const LINE_ORIENTED = 0b100;
    }
}

impl Capabilities {
    /// Capabilities of a stream opened with `mode`; empty unless exactly one
    /// direction is set.
    pub fn from_mode(mode: OpenMode) -> Self {
        match (mode.is_input(), mode.is_output()) {
            (true, false) if mode.is_binary() => Capabilities::READABLE,
            (true, false) => Capabilities::READABLE | Capabilities::LINE_ORIENTED,
            (false, true) => Capabilities::WRITABLE,
            _ => Capabilities::empty(),
        }
    }
}

/// Coarse lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Closed,
    OpenReadable,
    OpenWritable,
    /// Readable stream whose input is exhausted.
    Eof,
    Failed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamState::Closed => "closed",
            StreamState::OpenReadable => "open-readable",
            StreamState::OpenWritable => "open-writable",
            StreamState::Eof => "eof",
            StreamState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Stream tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZStreamConfig {
    /// Compressed-side buffer size: write threshold on output, read chunk on
    /// input. The decoded side holds at most `decode_budget()` per refill.
    pub buffer_size: usize,

    /// Deflate level 0..=9; out-of-range values fall back to the default.
    pub level: u32,
}

impl Default for ZStreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            level: DEFAULT_LEVEL_DEFLATE,
        }
    }
}

impl ZStreamConfig {
    pub fn new(buffer_size: Option<usize>, level: Option<u32>) -> Self {
        Self {
            buffer_size: buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE),
            level: level.unwrap_or(DEFAULT_LEVEL_DEFLATE),
        }
    }

    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { buffer_size, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(StreamError::InvalidBufferSize {
                size: self.buffer_size,
                max: MAX_BUFFER_SIZE,
            });
        }
        Ok(())
    }

    /// Most decoded bytes one input refill may buffer.
    pub fn decode_budget(&self) -> usize {
        self.buffer_size.saturating_mul(DECODE_BUDGET_FACTOR)
    }

    /// Level handed to the compressor.
    pub fn effective_level(&self) -> u32 {
        if self.level > MAX_LEVEL_DEFLATE {
            DEFAULT_LEVEL_DEFLATE
        } else {
            self.level
        }
    }
}
