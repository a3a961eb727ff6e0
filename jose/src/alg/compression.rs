use std::io::{Read as _, Write as _};

use flate2::{Compression, read::DeflateDecoder, write::DeflateEncoder};

use crate::prelude::*;

/// 'DEF': raw DEFLATE as per [RFC 1951][1]
///
/// [1]: https://www.rfc-editor.org/rfc/rfc1951
#[derive(Debug, Copy, Clone)]
pub struct Deflate {
    level: Compression,
    max_size: usize,
}

impl Deflate {
    /// Default upper bound in bytes of an uncompressed payload
    pub const DEFAULT_MAX_SIZE: usize = 250 * 1024;

    /// With a compression level from 0 (none) to 9 (best)
    pub fn new(level: u32) -> JoseResult<Self> {
        if level > 9 {
            return Err(JoseError::InvalidArgument(format!("invalid compression level {level}")));
        }
        Ok(Self {
            level: Compression::new(level),
            ..Self::default()
        })
    }

    /// Same method refusing to inflate more than `max_size` bytes
    pub fn with_max_size(self, max_size: usize) -> Self {
        Self { max_size, ..self }
    }
}

impl Default for Deflate {
    fn default() -> Self {
        Self {
            level: Compression::default(),
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }
}

impl Algorithm for Deflate {
    fn name(&self) -> &'static str {
        "DEF"
    }
}

impl CompressionMethod for Deflate {
    fn compress(&self, data: &[u8]) -> JoseResult<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn uncompress(&self, data: &[u8]) -> JoseResult<Vec<u8>> {
        let limit = u64::try_from(self.max_size).unwrap_or(u64::MAX).saturating_add(1);
        let mut decoded = Vec::new();
        DeflateDecoder::new(data).take(limit).read_to_end(&mut decoded)?;
        if decoded.len() > self.max_size {
            tracing::debug!(max_size = self.max_size, "inflated payload too large");
            return Err(JoseError::PayloadTooLarge(self.max_size));
        }
        Ok(decoded)
    }
}
