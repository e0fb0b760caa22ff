/// Default buffer size for both the compressed and uncompressed side (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Max buffer size sanity bound (32 MiB).
pub const MAX_BUFFER_SIZE: usize = 32 * 1024 * 1024;

/// Decoded bytes one input refill may produce, as a multiple of `buffer_size`.
pub const DECODE_BUDGET_FACTOR: usize = 4;

/// Value reported by `native_handle()` when no file is attached.
pub const EMPTY_NATIVE_HANDLE: i32 = -1;

/// Value reported by `tellg()` / `tellp()` once eof or fail is set on an open stream.
pub const INVALID_POSITION: i64 = -1;

/// Delimiter used by line-oriented reads.
pub const NEWLINE: u8 = b'\n';

/// Suffix used by the file helpers and `myzip`.
pub const GZIP_SUFFIX: &str = ".gz";
