//! codecs/auto.rs
//! Read-side format detection: gzip or zlib, decided from the first two bytes.

use crate::compression::registry::create_decompressor;
use crate::compression::types::{CompressionError, CompressionFormat, Decompressor};

const MAGIC_LEN: usize = 2;

pub struct AutoDecompressor {
    lead: Vec<u8>,
    inner: Option<Box<dyn Decompressor + Send>>,
}

impl AutoDecompressor {
    pub fn new() -> Result<Box<dyn Decompressor + Send>, CompressionError> {
        Ok(Box::new(Self::default()))
    }
}

impl Default for AutoDecompressor {
    fn default() -> Self {
        Self { lead: Vec::with_capacity(MAGIC_LEN), inner: None }
    }
}

impl Decompressor for AutoDecompressor {
    fn decompress_bounded(&mut self, input: &[u8], out: &mut Vec<u8>, max_out: usize) -> Result<usize, CompressionError> {
        if let Some(inner) = self.inner.as_mut() {
            return inner.decompress_bounded(input, out, max_out);
        }

        let take = (MAGIC_LEN - self.lead.len()).min(input.len());
        self.lead.extend_from_slice(&input[..take]);
        let format = match CompressionFormat::sniff(&self.lead) {
            None => return Ok(take),
            Some(found) => found?,
        };
        tracing::debug!(%format, "detected compressed format");

        // two magic bytes never produce output, so the inner codec takes them whole
        let lead = std::mem::take(&mut self.lead);
        let inner = self.inner.insert(create_decompressor(format)?);
        inner.decompress_chunk(&lead, out)?;
        let used = inner.decompress_bounded(&input[take..], out, max_out)?;
        Ok(take + used)
    }

    fn finish(&mut self) -> Result<(), CompressionError> {
        match self.inner.as_mut() {
            Some(inner) => inner.finish(),
            None if self.lead.is_empty() => Ok(()),
            None => Err(CompressionError::Truncated {
                format: "auto",
                msg: format!("only {} byte(s) of input", self.lead.len()),
            }),
        }
    }

    fn total_in(&self) -> u64 {
        match &self.inner {
            Some(inner) => inner.total_in(),
            None => self.lead.len() as u64,
        }
    }

    fn total_out(&self) -> u64 {
        self.inner.as_ref().map_or(0, |inner| inner.total_out())
    }
}
