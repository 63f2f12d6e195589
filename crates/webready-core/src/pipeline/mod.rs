//! The image transformation pipeline.
//!
//! Stages, in the order an item flows through them:
//! - **decode**: bytes in, normalized sRGB pixel buffer out
//! - **resize**: long-edge constrained downscale, never upscale
//! - **watermark**: optional alpha-over compositing of an overlay
//! - **metadata**: optional stripping of auxiliary metadata
//! - **encode**: JPEG/WebP serialization with size measurement
//! - **processor**: wires the stages for a single item
//! - **batch**: applies the pipeline independently to each named blob

pub mod batch;
pub mod decode;
pub mod encode;
pub mod metadata;
pub mod processor;
pub mod resize;
pub mod watermark;

// Re-exports for convenient access
pub use batch::BatchOptions;
pub use metadata::MetadataStripper;
pub use processor::ImageProcessor;
pub use resize::Resizer;
pub use watermark::Compositor;
