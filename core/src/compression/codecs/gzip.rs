//! codecs/gzip.rs
//! Streaming gzip (RFC 1952) over raw deflate.
//!
//! Design notes:
//! - Framing (header, CRC32, ISIZE) is done here; flate2 only sees raw deflate.
//! - The compressor never forces a deflate flush: data the deflater withholds
//!   stays withheld until `finish`.
//! - The decompressor is incremental across arbitrary chunk boundaries
//!   (header, body and trailer may be split anywhere) and decodes
//!   concatenated members back to back.

use crc32fast::Hasher;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tracing::trace;

use crate::compression::constants::{gzip::TRAILER_LEN, CODEC_OUTPUT_RESERVE, DEFAULT_LEVEL_DEFLATE, MAX_LEVEL_DEFLATE};
use crate::compression::header::{decode_trailer, encode_trailer, GzipHeader};
use crate::compression::types::{CompressionError, Compressor, Decompressor};

const CODEC: &str = "gzip";

fn process_failed(e: impl std::fmt::Display) -> CompressionError {
    CompressionError::CodecProcessFailed { codec: CODEC, msg: e.to_string() }
}

pub struct GzipCompressor {
    deflater: Compress,
    header: GzipHeader,
    crc: Hasher,
    header_written: bool,
    finished: bool,
    framing_out: u64,
}

impl GzipCompressor {
    /// Levels outside 0..=9 fall back to the default level.
    pub fn new(level: u32) -> Result<Box<dyn Compressor + Send>, CompressionError> {
        Ok(Box::new(Self::with_header(level, GzipHeader::for_level(normalize_level(level)))))
    }

    fn with_header(level: u32, header: GzipHeader) -> Self {
        let level = normalize_level(level);
        Self {
            // false: raw deflate, we write the gzip framing ourselves
            deflater: Compress::new(Compression::new(level), false),
            header,
            crc: Hasher::new(),
            header_written: false,
            finished: false,
            framing_out: 0,
        }
    }

    fn ensure_header(&mut self, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        if !self.header_written {
            let bytes = self.header.encode()?;
            self.framing_out += bytes.len() as u64;
            out.extend_from_slice(&bytes);
            self.header_written = true;
        }
        Ok(())
    }

    fn deflate(&mut self, mut input: &[u8], out: &mut Vec<u8>, flush: FlushCompress) -> Result<(), CompressionError> {
        loop {
            out.reserve(CODEC_OUTPUT_RESERVE);
            let before_in = self.deflater.total_in();
            let before_out = self.deflater.total_out();

            let status = self.deflater.compress_vec(input, out, flush).map_err(process_failed)?;

            let consumed = (self.deflater.total_in() - before_in) as usize;
            let produced = (self.deflater.total_out() - before_out) as usize;
            input = &input[consumed..];

            if flush == FlushCompress::Finish {
                if status == Status::StreamEnd {
                    return Ok(());
                }
            } else if input.is_empty() && out.len() < out.capacity() {
                // everything accepted, nothing left waiting for output space
                return Ok(());
            }

            if consumed == 0 && produced == 0 && out.len() < out.capacity() {
                return Err(process_failed("deflate made no progress"));
            }
        }
    }
}

fn normalize_level(level: u32) -> u32 {
    if level <= MAX_LEVEL_DEFLATE {
        level
    } else {
        DEFAULT_LEVEL_DEFLATE
    }
}

impl Compressor for GzipCompressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        if self.finished {
            return Err(CompressionError::StateError("gzip member already finished".into()));
        }
        self.ensure_header(out)?;
        self.crc.update(input);
        self.deflate(input, out, FlushCompress::None)
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        if self.finished {
            return Ok(());
        }
        self.ensure_header(out)?;
        self.deflate(&[], out, FlushCompress::Finish)?;

        // ISIZE is the input length modulo 2^32
        let isize = self.deflater.total_in() as u32;
        out.extend_from_slice(&encode_trailer(self.crc.clone().finalize(), isize));
        self.framing_out += TRAILER_LEN as u64;
        self.finished = true;

        trace!(total_in = self.deflater.total_in(), total_out = self.total_out(), "gzip member finished");
        Ok(())
    }

    fn total_in(&self) -> u64 {
        self.deflater.total_in()
    }

    fn total_out(&self) -> u64 {
        self.framing_out + self.deflater.total_out()
    }
}

/// Where the decoder is within the current member.
enum Member {
    /// Collecting header bytes (possibly none yet).
    Header(Vec<u8>),
    Body,
    Trailer(Vec<u8>),
    /// A complete member has been verified.
    Done,
    /// Zero bytes after the last member, skipped as gunzip does.
    Padding,
}

pub struct GzipDecompressor {
    inflater: Decompress,
    state: Member,
    crc: Hasher,
    member_len: u32,
    members: u64,
    total_in: u64,
    total_out: u64,
}

impl GzipDecompressor {
    pub fn new() -> Result<Box<dyn Decompressor + Send>, CompressionError> {
        Ok(Box::new(Self::default()))
    }

    fn begin_body(&mut self) {
        self.inflater.reset(false);
        self.crc = Hasher::new();
        self.member_len = 0;
        self.state = Member::Body;
    }

    /// Inflate `input`, producing at most `room` bytes.
    /// Returns bytes consumed and whether the deflate body ended.
    fn inflate(&mut self, input: &[u8], out: &mut Vec<u8>, mut room: usize) -> Result<(usize, bool), CompressionError> {
        let mut consumed = 0usize;
        loop {
            let start = out.len();
            let window = room.min(CODEC_OUTPUT_RESERVE);
            out.resize(start + window, 0);
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();

            let res = self
                .inflater
                .decompress(&input[consumed..], &mut out[start..], FlushDecompress::None);

            let used = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            out.truncate(start + produced);
            let status = res.map_err(process_failed)?;

            consumed += used;
            room -= produced;
            self.crc.update(&out[start..]);
            self.member_len = self.member_len.wrapping_add(produced as u32);
            self.total_out += produced as u64;

            if status == Status::StreamEnd {
                return Ok((consumed, true));
            }

            let output_full = produced == window;
            if room == 0 || (consumed == input.len() && !output_full) {
                return Ok((consumed, false));
            }
            if used == 0 && produced == 0 {
                return Err(process_failed("inflate made no progress"));
            }
        }
    }

    fn verify_trailer(&self, trailer: &[u8; TRAILER_LEN]) -> Result<(), CompressionError> {
        let (expected_crc, expected_len) = decode_trailer(trailer);
        let actual_crc = self.crc.clone().finalize();
        if expected_crc != actual_crc {
            return Err(CompressionError::ChecksumMismatch {
                format: CODEC,
                expected: expected_crc,
                actual: actual_crc,
            });
        }
        if expected_len != self.member_len {
            return Err(CompressionError::LengthMismatch {
                format: CODEC,
                expected: expected_len,
                actual: self.member_len,
            });
        }
        Ok(())
    }

    fn step(&mut self, rest: &mut &[u8], out: &mut Vec<u8>, room: usize) -> Result<bool, CompressionError> {
        let input = *rest;
        match std::mem::replace(&mut self.state, Member::Done) {
            Member::Header(mut buf) => {
                if input.is_empty() {
                    self.state = Member::Header(buf);
                    return Ok(false);
                }
                let seen = buf.len();
                buf.extend_from_slice(input);
                match GzipHeader::parse(&buf)? {
                    None => {
                        *rest = &[];
                        self.state = Member::Header(buf);
                        Ok(false)
                    }
                    Some((header, len)) => {
                        trace!(member = self.members, header_len = len, os = header.os, "gzip header");
                        *rest = &input[len - seen..];
                        self.begin_body();
                        Ok(true)
                    }
                }
            }
            Member::Body => {
                self.state = Member::Body;
                let (consumed, ended) = self.inflate(input, out, room)?;
                *rest = &input[consumed..];
                if ended {
                    self.state = Member::Trailer(Vec::with_capacity(TRAILER_LEN));
                }
                Ok(ended)
            }
            Member::Trailer(mut buf) => {
                let take = (TRAILER_LEN - buf.len()).min(input.len());
                buf.extend_from_slice(&input[..take]);
                *rest = &input[take..];
                let trailer: [u8; TRAILER_LEN] = match buf.as_slice().try_into() {
                    Ok(t) => t,
                    Err(_) => {
                        self.state = Member::Trailer(buf);
                        return Ok(false);
                    }
                };
                self.verify_trailer(&trailer)?;
                self.members += 1;
                trace!(members = self.members, len = self.member_len, "gzip member verified");
                self.state = Member::Done;
                Ok(true)
            }
            Member::Done => match input.first() {
                None => Ok(false),
                Some(0) => {
                    self.state = Member::Padding;
                    Ok(true)
                }
                Some(_) => {
                    // concatenated members decode as one stream, as gunzip does
                    self.state = Member::Header(Vec::new());
                    Ok(true)
                }
            },
            Member::Padding => {
                self.state = Member::Padding;
                let zeros = input.iter().take_while(|&&b| b == 0).count();
                *rest = &input[zeros..];
                if zeros < input.len() {
                    return Err(CompressionError::InvalidHeader {
                        format: CODEC,
                        msg: format!("garbage after zero padding, {} member(s) decoded", self.members),
                    });
                }
                Ok(false)
            }
        }
    }
}

impl Default for GzipDecompressor {
    fn default() -> Self {
        Self {
            inflater: Decompress::new(false),
            state: Member::Header(Vec::new()),
            crc: Hasher::new(),
            member_len: 0,
            members: 0,
            total_in: 0,
            total_out: 0,
        }
    }
}

impl Decompressor for GzipDecompressor {
    fn decompress_bounded(&mut self, input: &[u8], out: &mut Vec<u8>, max_out: usize) -> Result<usize, CompressionError> {
        let budget = max_out.max(1);
        let start = out.len();
        let mut rest = input;

        // `step` returns true while it can make progress without more input
        loop {
            let produced = out.len() - start;
            if produced >= budget {
                break;
            }
            match self.step(&mut rest, out, budget - produced) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    self.total_in += (input.len() - rest.len()) as u64;
                    return Err(e);
                }
            }
        }
        let used = input.len() - rest.len();
        self.total_in += used as u64;
        Ok(used)
    }

    fn finish(&mut self) -> Result<(), CompressionError> {
        let msg = match &self.state {
            Member::Done | Member::Padding => return Ok(()),
            Member::Header(buf) if buf.is_empty() && (self.members > 0 || self.total_in == 0) => return Ok(()),
            Member::Header(buf) => format!("incomplete header ({} bytes)", buf.len()),
            Member::Body => "deflate body incomplete".to_string(),
            Member::Trailer(buf) => format!("incomplete trailer ({} of {} bytes)", buf.len(), TRAILER_LEN),
        };
        Err(CompressionError::Truncated { format: CODEC, msg })
    }

    fn total_in(&self) -> u64 {
        self.total_in
    }

    fn total_out(&self) -> u64 {
        self.total_out
    }
}
