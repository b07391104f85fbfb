//! Request body compression.
//!
//! The connection treats compression as an opaque transform: it hands the
//! raw body to a [`BodyCompressor`] and sends whatever comes back, tagged
//! with the compressor's `Content-Encoding` token.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;

/// Error returned when a body cannot be compressed.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The encoder failed while writing or finishing the stream.
    #[error("Compression I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A custom compressor rejected the input.
    #[error("{0}")]
    Rejected(String),
}

/// Transforms a request body before transmission.
///
/// Implementations must be pure with respect to the input: the same bytes
/// always produce an equivalent encoding.
pub trait BodyCompressor: Send + Sync {
    /// Compresses `body`.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError`] if the body cannot be encoded.
    fn compress(&self, body: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// The `Content-Encoding` token describing the output of [`compress`](Self::compress).
    fn content_encoding(&self) -> &str;
}

/// Gzip body compressor backed by `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// Creates a compressor using the default gzip level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// Creates a compressor with an explicit level (0-9).
    #[must_use]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyCompressor for GzipCompressor {
    fn compress(&self, body: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2 + 32), self.level);
        encoder.write_all(body)?;
        Ok(encoder.finish()?)
    }

    fn content_encoding(&self) -> &str {
        "gzip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn gzip_output_decompresses_to_input() {
        let compressor = GzipCompressor::new();
        let compressed = compressor.compress(b"payload payload payload").unwrap();

        assert_eq!(gunzip(&compressed), b"payload payload payload");
    }

    #[test]
    fn gzip_output_has_magic_header() {
        let compressed = GzipCompressor::default().compress(b"x").unwrap();

        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn empty_body_compresses_to_valid_stream() {
        let compressed = GzipCompressor::new().compress(&[]).unwrap();

        assert!(gunzip(&compressed).is_empty());
    }

    #[test]
    fn level_is_clamped() {
        let compressor = GzipCompressor::with_level(42);
        let compressed = compressor.compress(b"abc").unwrap();

        assert_eq!(gunzip(&compressed), b"abc");
    }

    #[test]
    fn content_encoding_is_gzip() {
        assert_eq!(GzipCompressor::new().content_encoding(), "gzip");
    }

    #[test]
    fn compressor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GzipCompressor>();
    }
}
