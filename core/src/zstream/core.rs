//! zstream/core.rs
//! `ZStream`: a seekless gzip file stream with independent read/write cursors.
//!
//! Notes:
//! - One direction per open instance. Input streams inflate (gzip or zlib,
//!   auto-detected), output streams deflate into gzip members.
//! - Cursors count uncompressed bytes.
//! - eof and fail are sticky until `close()` or the next `open()`.
//! - Compressed output is held back until it reaches `buffer_size`, `sync()`,
//!   `final_sync()` or `close()`.
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::compression::{
    create_compressor, create_decompressor, CompressionError, CompressionFormat, Compressor, Decompressor,
};
use crate::constants::{EMPTY_NATIVE_HANDLE, INVALID_POSITION, NEWLINE};
use crate::openmode::{Direction, OpenMode};
use crate::telemetry::StreamCounters;
use crate::types::{Result, StreamError};
use crate::zstream::types::{Capabilities, IoState, StreamState, ZStreamConfig};

/// Read side: compressed chunks in, decoded bytes waiting to be consumed.
struct Inflater {
    decompressor: Box<dyn Decompressor + Send>,
    decoded: BytesMut,
    /// Compressed bytes read from the file; `chunk[start..end]` not yet decoded.
    chunk: Vec<u8>,
    start: usize,
    end: usize,
    /// Most decoded bytes one refill may add.
    budget: usize,
    eof_seen: bool,
    exhausted: bool,
    /// Codec error hit after some bytes of the same refill were decoded.
    deferred: Option<StreamError>,
}

impl Inflater {
    fn new(decompressor: Box<dyn Decompressor + Send>, config: &ZStreamConfig) -> Self {
        Self {
            decompressor,
            decoded: BytesMut::with_capacity(config.buffer_size),
            chunk: vec![0u8; config.buffer_size],
            start: 0,
            end: 0,
            budget: config.decode_budget(),
            eof_seen: false,
            exhausted: false,
            deferred: None,
        }
    }

    /// Decode until at least one new byte is available, adding at most
    /// `budget` bytes. Returns `false` once the file is exhausted and the
    /// codec ended cleanly.
    fn refill(&mut self, file: &mut File, counters: &mut StreamCounters) -> Result<bool> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        let mut out = Vec::new();
        while !self.exhausted {
            if self.start == self.end && !self.eof_seen {
                let n = match file.read(&mut self.chunk) {
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                };
                if n == 0 {
                    self.eof_seen = true;
                } else {
                    counters.add_physical_read(n);
                    self.start = 0;
                    self.end = n;
                }
            }

            let pending = &self.chunk[self.start..self.end];
            let stalled = match self.decompressor.decompress_bounded(pending, &mut out, self.budget) {
                Ok(used) => {
                    let stalled = used == 0 && !pending.is_empty();
                    self.start += used;
                    stalled
                }
                Err(e) if out.is_empty() => return Err(e.into()),
                Err(e) => {
                    self.deferred = Some(e.into());
                    false
                }
            };
            if !out.is_empty() {
                trace!(decoded = out.len(), pending = self.end - self.start, "refill");
                self.decoded.extend_from_slice(&out);
                return Ok(true);
            }
            if stalled {
                return Err(CompressionError::StateError("decoder accepted no input".into()).into());
            }
            if self.eof_seen && self.start == self.end {
                self.exhausted = true;
                self.decompressor.finish()?;
                trace!(total_in = self.decompressor.total_in(), "input exhausted");
            }
        }
        Ok(false)
    }

    fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.decoded.len());
        self.decoded.split_to(n).to_vec()
    }
}

/// Write side: compressor plus compressed bytes not yet written to the file.
struct Deflater {
    compressor: Box<dyn Compressor + Send>,
    pending: Vec<u8>,
    finalized: bool,
    /// Set after an I/O or codec error; the member can no longer be completed.
    broken: bool,
}

impl Deflater {
    fn push(&mut self, data: &[u8], threshold: usize, file: &mut File, counters: &mut StreamCounters) -> Result<()> {
        self.compressor.compress_chunk(data, &mut self.pending)?;
        if self.pending.len() >= threshold {
            self.drain(file, counters)?;
        }
        Ok(())
    }

    fn drain(&mut self, file: &mut File, counters: &mut StreamCounters) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        file.write_all(&self.pending)?;
        counters.add_physical_write(self.pending.len());
        trace!(bytes = self.pending.len(), "physical write");
        self.pending.clear();
        Ok(())
    }

    fn finish(&mut self, file: &mut File, counters: &mut StreamCounters) -> Result<()> {
        if !self.finalized {
            self.compressor.finish(&mut self.pending)?;
            self.finalized = true;
        }
        self.drain(file, counters)?;
        file.flush()?;
        Ok(())
    }
}

enum Codec {
    Idle,
    Inflate(Inflater),
    Deflate(Deflater),
}

/// Buffered gzip file stream.
///
/// ```no_run
/// use zstream_core::{OpenMode, ZStream};
///
/// let mut out = ZStream::open_path("log.gz", OpenMode::OUTPUT)?;
/// out.write(b"hello\n")?;
/// out.close()?;
///
/// let mut input = ZStream::open_path("log.gz", OpenMode::INPUT)?;
/// assert_eq!(input.read_line(None)?, b"hello\n");
/// # Ok::<(), zstream_core::StreamError>(())
/// ```
pub struct ZStream {
    mode: OpenMode,
    config: ZStreamConfig,
    path: Option<PathBuf>,
    file: Option<File>,
    codec: Codec,
    state: IoState,
    tellg: u64,
    tellp: u64,
    gcount: usize,
    counters: StreamCounters,
}

impl Default for ZStream {
    fn default() -> Self {
        Self::with_config(ZStreamConfig::default())
    }
}

impl ZStream {
    /// Closed stream in input mode with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed stream; `config` is validated when the stream is opened.
    pub fn with_config(config: ZStreamConfig) -> Self {
        Self {
            mode: OpenMode::default(),
            config,
            path: None,
            file: None,
            codec: Codec::Idle,
            state: IoState::empty(),
            tellg: 0,
            tellp: 0,
            gcount: 0,
            counters: StreamCounters::default(),
        }
    }

    pub fn open_path(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::open_path_with(path, mode, ZStreamConfig::default())
    }

    pub fn open_path_with(path: impl AsRef<Path>, mode: OpenMode, config: ZStreamConfig) -> Result<Self> {
        let mut zs = Self::with_config(config.clone());
        zs.open_with(path, mode, config)?;
        Ok(zs)
    }

    // ---- lifecycle ----

    pub fn open(&mut self, path: impl AsRef<Path>, mode: OpenMode) -> Result<()> {
        let config = self.config.clone();
        self.open_with(path, mode, config)
    }

    pub fn open_with(&mut self, path: impl AsRef<Path>, mode: OpenMode, config: ZStreamConfig) -> Result<()> {
        if self.is_open() {
            return Err(StreamError::AlreadyOpen);
        }
        let direction = mode.direction()?;
        config.validate()?;

        let path = path.as_ref();
        self.mode = mode;
        self.config = config;
        self.reset();

        let opened = match direction {
            Direction::Input => File::open(path),
            Direction::Output => File::create(path),
        };
        let file = opened.map_err(|e| {
            self.state.insert(IoState::FAIL);
            StreamError::Io(e)
        })?;

        let codec = match direction {
            Direction::Input => create_decompressor(CompressionFormat::Auto)
                .map(|decompressor| Codec::Inflate(Inflater::new(decompressor, &self.config))),
            Direction::Output => {
                create_compressor(CompressionFormat::Gzip, Some(self.config.effective_level())).map(|compressor| {
                    Codec::Deflate(Deflater {
                        compressor,
                        pending: Vec::with_capacity(self.config.buffer_size),
                        finalized: false,
                        broken: false,
                    })
                })
            }
        };
        let codec = codec.map_err(|e| {
            self.state.insert(IoState::FAIL);
            StreamError::Compression(e)
        })?;

        self.codec = codec;

        self.file = Some(file);
        self.path = Some(path.to_path_buf());
        debug!(
            path = %path.display(),
            mode = %self.mode,
            buffer_size = self.config.buffer_size,
            "zstream opened"
        );
        Ok(())
    }

    /// Finish pending output (trailer included), then release the file.
    ///
    /// Idempotent. The handle is released even when the final flush fails,
    /// in which case that error is returned.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        let result = match &mut self.codec {
            Codec::Deflate(d) if !d.broken => d.finish(&mut file, &mut self.counters),
            _ => Ok(()),
        };
        drop(file);

        debug!(
            path = ?self.path,
            tellg = self.tellg,
            tellp = self.tellp,
            compressed_out = self.counters.bytes_compressed_out,
            ok = result.is_ok(),
            "zstream closed"
        );

        self.codec = Codec::Idle;
        self.path = None;
        self.reset();
        result
    }

    fn reset(&mut self) {
        self.state = IoState::empty();
        self.tellg = 0;
        self.tellp = 0;
        self.gcount = 0;
        self.counters = StreamCounters::default();
    }

    /// Record a failure: fail bit always, and an I/O or codec error on the
    /// write side makes the current member unfinishable.
    fn failed(&mut self, err: StreamError) -> StreamError {
        self.state.insert(IoState::FAIL);
        if matches!(err, StreamError::Io(_) | StreamError::Compression(_)) {
            if let Codec::Deflate(d) = &mut self.codec {
                d.broken = true;
            }
            debug!(category = err.category(), error = %err, "zstream failed");
        }
        err
    }

    // ---- write side ----

    fn output_parts(&mut self) -> Option<(&mut File, &mut Deflater, &mut StreamCounters)> {
        match (self.file.as_mut(), &mut self.codec) {
            (Some(file), Codec::Deflate(d)) => Some((file, d, &mut self.counters)),
            _ => None,
        }
    }

    /// Compress `data` into the stream; returns `data.len()`.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let threshold = self.config.buffer_size;
        let failed = self.state.contains(IoState::FAIL);
        let Some((file, deflater, counters)) = self.output_parts() else {
            return Err(self.failed(StreamError::NotWritable));
        };
        if failed {
            return Err(StreamError::Failed);
        }
        if deflater.finalized {
            return Err(StreamError::Finalized);
        }

        match deflater.push(data, threshold, file, counters) {
            Ok(()) => {
                self.tellp += data.len() as u64;
                self.counters.add_write(data.len());
                Ok(data.len())
            }
            Err(e) => Err(self.failed(e)),
        }
    }

    /// `write` each element in turn; returns the total byte count.
    pub fn write_lines<I, T>(&mut self, lines: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut total = 0;
        for line in lines {
            total += self.write(line.as_ref())?;
        }
        Ok(total)
    }

    /// Write buffered compressed bytes to the file and flush it.
    ///
    /// Data the compressor still withholds stays there, so the file is not
    /// necessarily decodable up to `tellp()` afterwards. No-op unless open
    /// for output.
    pub fn sync(&mut self) -> Result<()> {
        let failed = self.state.contains(IoState::FAIL);
        let Some((file, deflater, counters)) = self.output_parts() else {
            return Ok(());
        };
        if failed {
            return Err(StreamError::Failed);
        }
        let res = deflater.drain(file, counters).and_then(|_| file.flush().map_err(StreamError::from));
        res.map_err(|e| self.failed(e))
    }

    /// Finish the gzip member and flush it, keeping the stream open.
    ///
    /// Counters stay readable until `close()`; later writes return
    /// `Finalized`. No-op unless open for output.
    pub fn final_sync(&mut self) -> Result<()> {
        let failed = self.state.contains(IoState::FAIL);
        let Some((file, deflater, counters)) = self.output_parts() else {
            return Ok(());
        };
        if failed {
            return Err(StreamError::Failed);
        }
        if let Err(e) = deflater.finish(file, counters) {
            return Err(self.failed(e));
        }
        debug!(
            tellp = self.tellp,
            compressed_out = self.counters.bytes_compressed_out,
            "zstream finalized"
        );
        Ok(())
    }

    // ---- read side ----

    /// Checks readability; `Ok(false)` when a prior failure makes reads return empty.
    fn begin_read(&mut self) -> Result<bool> {
        if !self.is_readable() {
            self.gcount = 0;
            return Err(self.failed(StreamError::NotReadable));
        }
        self.gcount = 0;
        Ok(!self.state.contains(IoState::FAIL))
    }

    fn fill(&mut self) -> Result<bool> {
        let res = match (self.file.as_mut(), &mut self.codec) {
            (Some(file), Codec::Inflate(inf)) => inf.refill(file, &mut self.counters),
            _ => Ok(false),
        };
        res.map_err(|e| self.failed(e))
    }

    fn buffered(&self) -> &[u8] {
        match &self.codec {
            Codec::Inflate(inf) => &inf.decoded[..],
            _ => &[],
        }
    }

    fn consume(&mut self, n: usize) -> Vec<u8> {
        let out = match &mut self.codec {
            Codec::Inflate(inf) => inf.take(n),
            _ => Vec::new(),
        };
        self.tellg += out.len() as u64;
        self.gcount = out.len();
        self.counters.add_read(out.len());
        out
    }

    /// Decode until `want` bytes are buffered or input ends.
    /// Returns `true` if input ended.
    fn fill_to(&mut self, want: usize) -> Result<bool> {
        while self.buffered().len() < want {
            if !self.fill()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Strict read.
    ///
    /// - `Some(n)`: up to `n` bytes; fewer than `n` sets eof and fail.
    /// - `None`: everything up to the end of input; sets eof, never fail.
    pub fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        if !self.begin_read()? {
            return Ok(Vec::new());
        }
        match n {
            Some(0) => Ok(Vec::new()),
            Some(n) => {
                if self.state.contains(IoState::EOF) {
                    self.state.insert(IoState::FAIL);
                    return Ok(Vec::new());
                }
                self.fill_to(n)?;
                let out = self.consume(n);
                if out.len() < n {
                    self.state.insert(IoState::EOF | IoState::FAIL);
                }
                Ok(out)
            }
            None => {
                self.fill_to(usize::MAX)?;
                let len = self.buffered().len();
                let out = self.consume(len);
                self.state.insert(IoState::EOF);
                Ok(out)
            }
        }
    }

    /// Tolerant read of up to `n` bytes, stopping before `delim`.
    ///
    /// The delimiter is left unread. Sets eof if input runs out during the
    /// call; a short result never sets fail.
    pub fn get(&mut self, n: usize, delim: u8) -> Result<Vec<u8>> {
        if !self.begin_read()? || n == 0 || self.state.contains(IoState::EOF) {
            return Ok(Vec::new());
        }
        let mut scanned = 0;
        loop {
            let buf = self.buffered();
            let limit = buf.len().min(n);
            if let Some(i) = buf[scanned..limit].iter().position(|&b| b == delim) {
                return Ok(self.consume(scanned + i));
            }
            if limit == n {
                return Ok(self.consume(n));
            }
            scanned = limit;
            if !self.fill()? {
                let out = self.consume(n);
                self.state.insert(IoState::EOF);
                return Ok(out);
            }
        }
    }

    /// One line including its `\n`, or at most `max` bytes.
    ///
    /// eof is lazy: a line that ends exactly at the end of input does not set
    /// it. The next call finds nothing, sets eof and returns empty.
    pub fn read_line(&mut self, max: Option<usize>) -> Result<Vec<u8>> {
        if !self.begin_read()? || max == Some(0) || self.state.contains(IoState::EOF) {
            return Ok(Vec::new());
        }
        let max = max.unwrap_or(usize::MAX);
        let mut scanned = 0;
        loop {
            let buf = self.buffered();
            let limit = buf.len().min(max);
            if let Some(i) = buf[scanned..limit].iter().position(|&b| b == NEWLINE) {
                return Ok(self.consume(scanned + i + 1));
            }
            if limit == max {
                return Ok(self.consume(max));
            }
            scanned = limit;
            if !self.fill()? {
                if self.buffered().is_empty() {
                    self.state.insert(IoState::EOF);
                    return Ok(Vec::new());
                }
                return Ok(self.consume(max));
            }
        }
    }

    /// Lines until their total length reaches `hint`, or until eof.
    /// `None` and `Some(0)` read every remaining line.
    pub fn read_lines(&mut self, hint: Option<usize>) -> Result<Vec<Vec<u8>>> {
        let hint = hint.filter(|&h| h > 0);
        let mut lines = Vec::new();
        let mut total = 0;
        loop {
            let line = self.read_line(None)?;
            if line.is_empty() {
                break;
            }
            total += line.len();
            lines.push(line);
            if hint.is_some_and(|h| total >= h) {
                break;
            }
        }
        self.gcount = total;
        Ok(lines)
    }

    /// Up to `max` bytes from what is already decoded, decoding more only if
    /// nothing is. Returns empty and sets eof at the end of input.
    pub fn read_some(&mut self, max: usize) -> Result<Vec<u8>> {
        if !self.begin_read()? || max == 0 || self.state.contains(IoState::EOF) {
            return Ok(Vec::new());
        }
        if self.available() == 0 && !self.fill()? {
            self.state.insert(IoState::EOF);
            return Ok(Vec::new());
        }
        Ok(self.consume(max))
    }

    // ---- unsupported ----

    pub fn seek(&mut self, _pos: i64) -> Result<u64> {
        Err(StreamError::unsupported("seek"))
    }

    pub fn truncate(&mut self, _len: Option<u64>) -> Result<u64> {
        Err(StreamError::unsupported("truncate"))
    }

    // ---- queries ----

    fn position(&self, cursor: u64) -> i64 {
        if !self.is_open() {
            0
        } else if self.state.intersects(IoState::EOF | IoState::FAIL) {
            INVALID_POSITION
        } else {
            cursor as i64
        }
    }

    /// Read cursor; 0 when closed, -1 once eof or fail is set.
    pub fn tellg(&self) -> i64 {
        self.position(self.tellg)
    }

    /// Write cursor; 0 when closed, -1 once eof or fail is set.
    pub fn tellp(&self) -> i64 {
        self.position(self.tellp)
    }

    pub fn eof(&self) -> bool {
        self.state.contains(IoState::EOF)
    }

    pub fn fail(&self) -> bool {
        self.state.contains(IoState::FAIL)
    }

    /// Neither eof nor fail.
    pub fn good(&self) -> bool {
        self.state.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    pub fn is_readable(&self) -> bool {
        self.is_open() && self.mode.is_input()
    }

    pub fn is_writable(&self) -> bool {
        self.is_open() && self.mode.is_output()
    }

    pub fn is_binary(&self) -> bool {
        self.mode.is_binary()
    }

    /// Mode of the last `open()`; kept after `close()`.
    pub fn openmode(&self) -> OpenMode {
        self.mode
    }

    pub fn capabilities(&self) -> Capabilities {
        if self.is_open() {
            Capabilities::from_mode(self.mode)
        } else {
            Capabilities::empty()
        }
    }

    pub fn state(&self) -> StreamState {
        if !self.is_open() {
            StreamState::Closed
        } else if self.fail() {
            StreamState::Failed
        } else if self.eof() {
            StreamState::Eof
        } else if self.mode.is_input() {
            StreamState::OpenReadable
        } else {
            StreamState::OpenWritable
        }
    }

    /// OS descriptor of the open file, `-1` when closed.
    pub fn native_handle(&self) -> i32 {
        match &self.file {
            None => EMPTY_NATIVE_HANDLE,
            Some(file) => raw_handle(file),
        }
    }

    /// Decoded bytes buffered and not yet read.
    pub fn available(&self) -> usize {
        self.buffered().len()
    }

    /// Bytes extracted by the last input call.
    pub fn gcount(&self) -> usize {
        self.gcount
    }

    pub fn counters(&self) -> StreamCounters {
        self.counters
    }

    pub fn config(&self) -> &ZStreamConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(unix)]
fn raw_handle(file: &File) -> i32 {
    use std::os::unix::io::AsRawFd;
    file.as_raw_fd()
}

#[cfg(not(unix))]
fn raw_handle(_file: &File) -> i32 {
    0
}

impl Drop for ZStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(category = e.category(), error = %e, "zstream close on drop failed");
        }
    }
}

impl fmt::Debug for ZStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZStream")
            .field("mode", &self.mode)
            .field("state", &self.state())
            .field("path", &self.path)
            .field("tellg", &self.tellg())
            .field("tellp", &self.tellp())
            .field("buffer_size", &self.config.buffer_size)
            .finish()
    }
}

/// Tolerant reads: returns what is available, `Ok(0)` at end of input.
impl Read for ZStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.read_some(buf.len())?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

/// `flush` is `sync`: buffered output reaches the file, the trailer does not.
impl Write for ZStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(ZStream::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.sync()?)
    }
}
