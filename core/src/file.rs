//! file.rs
//! Whole-file compress / uncompress through `ZStream`.
//!
//! - Data moves in `buffer_size` blocks; files are never loaded whole.
//! - An existing destination is never overwritten.
//! - The source is removed only after the destination is complete.
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::constants::GZIP_SUFFIX;
use crate::openmode::OpenMode;
use crate::types::{Result, StreamError};
use crate::zstream::{ZStream, ZStreamConfig};

/// Bytes consumed from the source and produced into the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// What to do with a path given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    Compress { dst: PathBuf },
    Uncompress { dst: PathBuf },
}

/// `name.gz` uncompresses to `name`; anything else compresses to `name.gz`.
pub fn plan(src: &Path) -> FileAction {
    let name = src.as_os_str().to_string_lossy();
    match name.strip_suffix(GZIP_SUFFIX) {
        Some(stem) if !stem.is_empty() && !stem.ends_with(std::path::MAIN_SEPARATOR) => {
            FileAction::Uncompress { dst: PathBuf::from(stem) }
        }
        _ => {
            let mut dst = src.as_os_str().to_owned();
            dst.push(GZIP_SUFFIX);
            FileAction::Compress { dst: PathBuf::from(dst) }
        }
    }
}

fn refuse_existing(dst: &Path) -> Result<()> {
    if dst.exists() {
        return Err(StreamError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("output file [{}] already exists", dst.display()),
        )));
    }
    Ok(())
}

fn read_block(src: &mut File, buf: &mut [u8]) -> Result<usize> {
    loop {
        match src.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Compress `src` into gzip file `dst`.
pub fn deflate_file(src: &Path, dst: &Path, keep: bool, config: &ZStreamConfig) -> Result<CopyReport> {
    refuse_existing(dst)?;
    debug!(src = %src.display(), dst = %dst.display(), "compress file");

    let mut input = File::open(src)?;
    let mut out = ZStream::open_path_with(dst, OpenMode::OUTPUT | OpenMode::BINARY, config.clone())?;

    let mut buf = vec![0u8; config.buffer_size];
    let mut report = CopyReport::default();
    loop {
        let n = read_block(&mut input, &mut buf)?;
        if n == 0 {
            break;
        }
        out.write(&buf[..n])?;
        report.bytes_in += n as u64;
    }
    out.final_sync()?;
    report.bytes_out = out.counters().bytes_compressed_out;
    out.close()?;

    if !keep {
        fs::remove_file(src)?;
    }
    debug!(bytes_in = report.bytes_in, bytes_out = report.bytes_out, "compressed");
    Ok(report)
}

/// Uncompress gzip (or zlib) file `src` into `dst`.
pub fn inflate_file(src: &Path, dst: &Path, keep: bool, config: &ZStreamConfig) -> Result<CopyReport> {
    refuse_existing(dst)?;
    debug!(src = %src.display(), dst = %dst.display(), "uncompress file");

    let mut input = ZStream::open_path_with(src, OpenMode::INPUT | OpenMode::BINARY, config.clone())?;
    let mut output = File::create(dst)?;

    let mut report = CopyReport::default();
    loop {
        let block = input.read_some(config.buffer_size)?;
        if block.is_empty() {
            break;
        }
        output.write_all(&block)?;
        report.bytes_out += block.len() as u64;
    }
    output.flush()?;
    report.bytes_in = input.counters().bytes_compressed_in;
    input.close()?;

    if !keep {
        fs::remove_file(src)?;
    }
    debug!(bytes_in = report.bytes_in, bytes_out = report.bytes_out, "uncompressed");
    Ok(report)
}
