//! Codec capability table.
//!
//! Format support is resolved once at startup into an explicit table of
//! `format tag -> function` entries rather than looked up through ambient
//! codec state. `ImageProcessor` builds one registry and passes it by
//! reference to the stages that need it.

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{decode, encode};
use crate::types::{EncodeSpec, EncodedImage, OutputFormat, PixelBuffer, SourceFormat};

/// Decodes raw bytes into a normalized pixel buffer.
pub type DecodeFn = fn(&[u8]) -> PipelineResult<PixelBuffer>;

/// Serializes a pixel buffer into an encoded container.
pub type EncodeFn = fn(&PixelBuffer, &EncodeSpec) -> PipelineResult<EncodedImage>;

/// Table of supported codecs, resolved once.
pub struct CodecRegistry {
    decoders: Vec<(SourceFormat, DecodeFn)>,
    encoders: Vec<(OutputFormat, EncodeFn)>,
}

impl CodecRegistry {
    /// Build the registry with all supported codecs.
    pub fn new() -> Self {
        Self {
            decoders: vec![
                (SourceFormat::Jpeg, decode::decode_jpeg as DecodeFn),
                (SourceFormat::Png, decode::decode_png as DecodeFn),
                (SourceFormat::WebP, decode::decode_webp as DecodeFn),
                (SourceFormat::Tiff, decode::decode_tiff as DecodeFn),
            ],
            encoders: vec![
                (OutputFormat::Jpeg, encode::encode_jpeg as EncodeFn),
                (OutputFormat::WebP, encode::encode_webp as EncodeFn),
            ],
        }
    }

    /// Identify the source format from magic bytes.
    ///
    /// Returns `None` when the signature matches no supported container.
    pub fn sniff(bytes: &[u8]) -> Option<SourceFormat> {
        if bytes.len() < 12 {
            return None;
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(SourceFormat::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(SourceFormat::Png);
        }
        if bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            return Some(SourceFormat::WebP);
        }
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
            return Some(SourceFormat::Tiff);
        }
        None
    }

    /// Look up the decoder for a source format.
    pub fn decoder(&self, format: SourceFormat) -> PipelineResult<DecodeFn> {
        self.decoders
            .iter()
            .find(|(tag, _)| *tag == format)
            .map(|(_, f)| *f)
            .ok_or_else(|| PipelineError::UnsupportedFormat(format.as_str().to_string()))
    }

    /// Look up the encoder for an output format.
    pub fn encoder(&self, format: OutputFormat) -> PipelineResult<EncodeFn> {
        self.encoders
            .iter()
            .find(|(tag, _)| *tag == format)
            .map(|(_, f)| *f)
            .ok_or_else(|| PipelineError::UnsupportedOutputFormat(format.as_str().to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
