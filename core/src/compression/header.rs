//! compression/header.rs
//! gzip member header (RFC 1952 section 2.3): encode and incremental parse.
//!
//! The encoder writes the same minimal header zlib writes for
//! `deflateInit2(.., MAX_WBITS + 16, ..)`: no name, no comment, MTIME 0.
//! The parser accepts every optional field a conforming producer may emit.

use crate::compression::constants::gzip::*;
use crate::compression::types::CompressionError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GzipHeader {
    /// FTEXT hint.
    pub is_text: bool,
    /// Modification time, seconds since the epoch (0 = unknown).
    pub mtime: u32,
    pub xfl: u8,
    pub os: u8,
    pub extra: Option<Vec<u8>>,
    /// Original file name, without the zero terminator.
    pub filename: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    /// Whether a header CRC16 is present (verified on parse, emitted on encode).
    pub has_crc: bool,
}

impl GzipHeader {
    /// Header the stream encoder emits for a given deflate level.
    pub fn for_level(level: u32) -> Self {
        let xfl = match level {
            9 => XFL_MAX_COMPRESSION,
            0 | 1 => XFL_FASTEST,
            _ => 0,
        };
        GzipHeader {
            xfl,
            os: OS_UNIX,
            ..GzipHeader::default()
        }
    }

    fn flags(&self) -> u8 {
        let mut flg = 0u8;
        if self.is_text {
            flg |= FTEXT;
        }
        if self.has_crc {
            flg |= FHCRC;
        }
        if self.extra.is_some() {
            flg |= FEXTRA;
        }
        if self.filename.is_some() {
            flg |= FNAME;
        }
        if self.comment.is_some() {
            flg |= FCOMMENT;
        }
        flg
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::with_capacity(FIXED_HEADER_LEN);
        out.extend_from_slice(&MAGIC);
        out.push(CM_DEFLATE);
        out.push(self.flags());
        out.extend_from_slice(&self.mtime.to_le_bytes());
        out.push(self.xfl);
        out.push(self.os);

        if let Some(extra) = &self.extra {
            let xlen = u16::try_from(extra.len()).map_err(|_| CompressionError::InvalidHeader {
                format: "gzip",
                msg: format!("extra field too long: {} bytes", extra.len()),
            })?;
            out.extend_from_slice(&xlen.to_le_bytes());
            out.extend_from_slice(extra);
        }
        for field in [&self.filename, &self.comment].into_iter().flatten() {
            if field.contains(&0) {
                return Err(CompressionError::InvalidHeader {
                    format: "gzip",
                    msg: "name/comment may not contain NUL".into(),
                });
            }
            out.extend_from_slice(field);
            out.push(0);
        }
        if self.has_crc {
            let crc16 = (crc32fast::hash(&out) & 0xffff) as u16;
            out.extend_from_slice(&crc16.to_le_bytes());
        }
        Ok(out)
    }

    /// Try to parse a header from the start of `buf`.
    ///
    /// - `Ok(None)`: `buf` is a valid prefix, more bytes are needed.
    /// - `Ok(Some((header, len)))`: header occupies `buf[..len]`.
    /// - `Err(_)`: not a gzip header.
    pub fn parse(buf: &[u8]) -> Result<Option<(GzipHeader, usize)>, CompressionError> {
        // Validate what we have of the fixed part before asking for more.
        if (!buf.is_empty() && buf[0] != MAGIC[0]) || (buf.len() > 1 && buf[1] != MAGIC[1]) {
            return Err(invalid("bad magic"));
        }
        if buf.len() > 2 && buf[2] != CM_DEFLATE {
            return Err(invalid(format!("unknown compression method {}", buf[2])));
        }
        if buf.len() > 3 && buf[3] & FRESERVED != 0 {
            return Err(invalid(format!("reserved flag bits set: 0x{:02x}", buf[3])));
        }
        if buf.len() < FIXED_HEADER_LEN {
            return Ok(None);
        }

        let flg = buf[3];
        let mut header = GzipHeader {
            is_text: flg & FTEXT != 0,
            mtime: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            xfl: buf[8],
            os: buf[9],
            has_crc: flg & FHCRC != 0,
            ..GzipHeader::default()
        };
        let mut pos = FIXED_HEADER_LEN;

        if flg & FEXTRA != 0 {
            if buf.len() < pos + 2 {
                return Ok(None);
            }
            let xlen = u16::from_le_bytes([buf[pos], buf[pos + 1]]) as usize;
            pos += 2;
            if buf.len() < pos + xlen {
                return Ok(None);
            }
            header.extra = Some(buf[pos..pos + xlen].to_vec());
            pos += xlen;
        }
        if flg & FNAME != 0 {
            match take_zero_terminated(&buf[pos..]) {
                Some((name, used)) => {
                    header.filename = Some(name.to_vec());
                    pos += used;
                }
                None => return Ok(None),
            }
        }
        if flg & FCOMMENT != 0 {
            match take_zero_terminated(&buf[pos..]) {
                Some((comment, used)) => {
                    header.comment = Some(comment.to_vec());
                    pos += used;
                }
                None => return Ok(None),
            }
        }
        if header.has_crc {
            if buf.len() < pos + 2 {
                return Ok(None);
            }
            let expected = u16::from_le_bytes([buf[pos], buf[pos + 1]]);
            let actual = (crc32fast::hash(&buf[..pos]) & 0xffff) as u16;
            if expected != actual {
                return Err(CompressionError::ChecksumMismatch {
                    format: "gzip header",
                    expected: expected.into(),
                    actual: actual.into(),
                });
            }
            pos += 2;
        }

        Ok(Some((header, pos)))
    }
}

fn take_zero_terminated(buf: &[u8]) -> Option<(&[u8], usize)> {
    buf.iter().position(|&b| b == 0).map(|nul| (&buf[..nul], nul + 1))
}

fn invalid(msg: impl Into<String>) -> CompressionError {
    CompressionError::InvalidHeader { format: "gzip", msg: msg.into() }
}

/// Encode the 8-byte member trailer: CRC32 then ISIZE, both little-endian.
pub fn encode_trailer(crc: u32, isize: u32) -> [u8; TRAILER_LEN] {
    let mut out = [0u8; TRAILER_LEN];
    out[..4].copy_from_slice(&crc.to_le_bytes());
    out[4..].copy_from_slice(&isize.to_le_bytes());
    out
}

/// Decode a member trailer into `(crc32, isize)`.
pub fn decode_trailer(buf: &[u8; TRAILER_LEN]) -> (u32, u32) {
    (
        u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
        u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
    )
}
