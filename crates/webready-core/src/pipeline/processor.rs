//! Pipeline orchestration for a single item: sniff, decode, resize,
//! watermark, strip, encode.

use crate::codec::CodecRegistry;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{
    EncodeSpec, EncodedImage, ResizeSpec, SourceFormat, WatermarkSpec,
};

use super::metadata::MetadataStripper;
use super::resize::Resizer;
use super::watermark::Compositor;

/// The main processor: applies the full transformation pipeline to one
/// in-memory image blob.
///
/// Holds no per-item state, so independent instances (or one shared
/// reference) can process items concurrently if a caller wants to.
pub struct ImageProcessor {
    codecs: CodecRegistry,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {
            codecs: CodecRegistry::new(),
        }
    }

    /// Access the codec capability table.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Run the full pipeline on one image.
    ///
    /// `declared` is consulted only when format sniffing fails, so a
    /// mislabeled file is still decoded by what it actually contains.
    pub fn process(
        &self,
        name: &str,
        bytes: &[u8],
        declared: Option<SourceFormat>,
        resize: &ResizeSpec,
        watermark: Option<&WatermarkSpec>,
        encode: &EncodeSpec,
    ) -> PipelineResult<EncodedImage> {
        let start = std::time::Instant::now();
        tracing::debug!("Processing: {}", name);

        let format = CodecRegistry::sniff(bytes).or(declared).ok_or_else(|| {
            PipelineError::UnsupportedFormat(format!("{name}: unrecognized container"))
        })?;

        let decode_start = std::time::Instant::now();
        let decode = self.codecs.decoder(format)?;
        let mut buffer = decode(bytes)?;
        tracing::trace!(
            "  Decode ({}, {}): {:?}",
            format.as_str(),
            buffer.source_mode.as_str(),
            decode_start.elapsed()
        );

        let resize_start = std::time::Instant::now();
        buffer = Resizer::resize(buffer, resize)?;
        tracing::trace!("  Resize: {:?}", resize_start.elapsed());

        if let Some(spec) = watermark {
            let wm_start = std::time::Instant::now();
            buffer = Compositor::composite(buffer, spec, resize.filter)?;
            tracing::trace!("  Watermark: {:?}", wm_start.elapsed());
        }

        MetadataStripper::apply(&mut buffer, encode.strip_metadata);

        let encode_start = std::time::Instant::now();
        let encode_fn = self.codecs.encoder(encode.format)?;
        let encoded = encode_fn(&buffer, encode)?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        tracing::debug!(
            "Processed {} in {:?} ({}x{}, {} bytes)",
            name,
            start.elapsed(),
            encoded.width,
            encoded.height,
            encoded.byte_size
        );
        Ok(encoded)
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}
