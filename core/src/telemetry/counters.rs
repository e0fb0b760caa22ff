//! telemetry/counters.rs
//! Byte and call counters collected by one open stream.
//!
//! Reset on `open()` and `close()`; read them after `final_sync()` to see
//! the totals of a finished output stream.
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCounters {
    /// Uncompressed bytes accepted by `write`.
    pub bytes_uncompressed_in: u64,
    /// Uncompressed bytes handed out by reads.
    pub bytes_uncompressed_out: u64,
    /// Compressed bytes read from the file.
    pub bytes_compressed_in: u64,
    /// Compressed bytes written to the file.
    pub bytes_compressed_out: u64,
    /// Number of `read` calls issued against the file.
    pub physical_reads: u64,
    /// Number of `write` calls issued against the file.
    pub physical_writes: u64,
}

impl StreamCounters {
    pub fn add_write(&mut self, len: usize) {
        self.bytes_uncompressed_in += len as u64;
    }

    pub fn add_read(&mut self, len: usize) {
        self.bytes_uncompressed_out += len as u64;
    }

    pub fn add_physical_read(&mut self, len: usize) {
        self.physical_reads += 1;
        self.bytes_compressed_in += len as u64;
    }

    pub fn add_physical_write(&mut self, len: usize) {
        self.physical_writes += 1;
        self.bytes_compressed_out += len as u64;
    }

    /// compressed / uncompressed for whichever direction carried data; 0.0 when empty.
    pub fn compression_ratio(&self) -> f64 {
        let (plain, packed) = if self.bytes_uncompressed_in > 0 {
            (self.bytes_uncompressed_in, self.bytes_compressed_out)
        } else {
            (self.bytes_uncompressed_out, self.bytes_compressed_in)
        };
        if plain == 0 {
            0.0
        } else {
            packed as f64 / plain as f64
        }
    }
}
