//! WebReady Core - Embeddable web-derivative image pipeline.
//!
//! WebReady turns camera-original images into web-ready derivatives:
//! color-managed, resized to a target long edge, optionally watermarked,
//! stripped of metadata, and re-encoded as JPEG or WebP.
//!
//! # Architecture
//!
//! The pipeline is pure and in-memory — bytes in, bytes out, no filesystem
//! or network access:
//!
//! ```text
//! Bytes → Decode (orient, sRGB) → Resize → Watermark → Strip → Encode → Bytes
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use webready_core::{EncodeSpec, ImageProcessor, ResizeSpec};
//!
//! fn main() -> webready_core::Result<()> {
//!     let processor = ImageProcessor::new();
//!     let bytes = std::fs::read("./photo.jpg")?;
//!     let encoded = processor.process(
//!         "photo.jpg",
//!         &bytes,
//!         None,
//!         &ResizeSpec::new(1920),
//!         None,
//!         &EncodeSpec::jpeg(85),
//!     )?;
//!     std::fs::write("./photo_web.jpg", &encoded.bytes)?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod codec;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use codec::CodecRegistry;
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, WebReadyError};
pub use output::{ReportFormat, ReportWriter};
pub use pipeline::{BatchOptions, Compositor, ImageProcessor, MetadataStripper, Resizer};
pub use types::{
    Anchor, BatchItem, BatchResult, BatchStats, ColorMode, EncodeSpec, EncodedImage, OutputFormat,
    PixelBuffer, ResampleFilter, ResizeSpec, SourceFormat, WatermarkSpec,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
