//! codecs/zlib.rs
//! zlib-wrapped (RFC 1950) deflate, read side only. flate2 checks the
//! zlib header and the Adler-32 trailer itself.

use flate2::{Decompress, FlushDecompress, Status};
use tracing::warn;

use crate::compression::constants::CODEC_OUTPUT_RESERVE;
use crate::compression::types::{CompressionError, Decompressor};

const CODEC: &str = "zlib";

pub struct ZlibDecompressor {
    inflater: Decompress,
    ended: bool,
    trailing: u64,
    total_in: u64,
}

impl ZlibDecompressor {
    pub fn new() -> Result<Box<dyn Decompressor + Send>, CompressionError> {
        Ok(Box::new(Self::default()))
    }
}

impl Default for ZlibDecompressor {
    fn default() -> Self {
        Self {
            // true: expect and verify the zlib wrapper
            inflater: Decompress::new(true),
            ended: false,
            trailing: 0,
            total_in: 0,
        }
    }
}

impl Decompressor for ZlibDecompressor {
    fn decompress_bounded(&mut self, input: &[u8], out: &mut Vec<u8>, max_out: usize) -> Result<usize, CompressionError> {
        let mut room = max_out.max(1);
        let mut rest = input;

        while !self.ended && room > 0 {
            let start = out.len();
            let window = room.min(CODEC_OUTPUT_RESERVE);
            out.resize(start + window, 0);
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();

            let res = self.inflater.decompress(rest, &mut out[start..], FlushDecompress::None);

            let used = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            out.truncate(start + produced);
            let status = res.map_err(|e| CompressionError::CodecProcessFailed { codec: CODEC, msg: e.to_string() })?;
            rest = &rest[used..];
            room -= produced;

            if status == Status::StreamEnd {
                self.ended = true;
                break;
            }
            let output_full = produced == window;
            if rest.is_empty() && !output_full {
                break;
            }
            if used == 0 && produced == 0 {
                return Err(CompressionError::CodecProcessFailed {
                    codec: CODEC,
                    msg: "inflate made no progress".into(),
                });
            }
        }

        if self.ended && !rest.is_empty() {
            // zlib has no multi-member form; anything after the Adler-32 is ignored
            if self.trailing == 0 {
                warn!(bytes = rest.len(), "ignoring data after end of zlib stream");
            }
            self.trailing += rest.len() as u64;
            rest = &[];
        }

        let used = input.len() - rest.len();
        self.total_in += used as u64;
        Ok(used)
    }

    fn finish(&mut self) -> Result<(), CompressionError> {
        if self.ended || self.total_in == 0 {
            Ok(())
        } else {
            Err(CompressionError::Truncated {
                format: CODEC,
                msg: format!("stream ended after {} compressed bytes", self.total_in),
            })
        }
    }

    fn total_in(&self) -> u64 {
        self.total_in
    }

    fn total_out(&self) -> u64 {
        self.inflater.total_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn decodes_reference_zlib_stream() {
        let data = b"zlib framed payload\n".repeat(30);
        let wire = zlib(&data);
        let mut d = ZlibDecompressor::default();
        let mut out = Vec::new();
        for chunk in wire.chunks(7) {
            d.decompress_chunk(chunk, &mut out).unwrap();
        }
        d.finish().unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn truncated_zlib_fails_finish() {
        let wire = zlib(b"some bytes that will be cut");
        let mut d = ZlibDecompressor::default();
        let mut out = Vec::new();
        d.decompress_chunk(&wire[..wire.len() - 2], &mut out).unwrap();
        assert!(matches!(d.finish(), Err(CompressionError::Truncated { .. })));
    }
}
