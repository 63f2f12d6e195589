//! Long-edge constrained resizing.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{PixelBuffer, ResizeSpec};

/// Resizes buffers so their long edge fits a target length.
pub struct Resizer;

impl Resizer {
    /// Fit `buffer` to the spec's target long edge.
    ///
    /// Never upscales: when the source long edge is already within the
    /// target the buffer passes through untouched, with no resample
    /// artifacts introduced.
    pub fn resize(mut buffer: PixelBuffer, spec: &ResizeSpec) -> PipelineResult<PixelBuffer> {
        if spec.target_long_edge == 0 {
            return Err(PipelineError::InvalidResizeTarget(spec.target_long_edge));
        }

        let (width, height) = (buffer.width(), buffer.height());
        let long_edge = width.max(height);
        if long_edge <= spec.target_long_edge {
            return Ok(buffer);
        }

        let (new_width, new_height) =
            Self::target_dimensions(width, height, spec.target_long_edge);
        tracing::trace!(
            "Resizing {}x{} -> {}x{}",
            width,
            height,
            new_width,
            new_height
        );
        buffer.image = buffer
            .image
            .resize_exact(new_width, new_height, spec.filter.to_filter_type());
        Ok(buffer)
    }

    /// Compute the downscaled dimensions for a target long edge.
    ///
    /// Both axes scale by the same factor, rounded to the nearest pixel and
    /// clamped to at least 1 so extreme aspect ratios never collapse.
    pub fn target_dimensions(width: u32, height: u32, target_long_edge: u32) -> (u32, u32) {
        let long_edge = width.max(height);
        let scale = f64::from(target_long_edge) / f64::from(long_edge);
        let new_width = ((f64::from(width) * scale).round() as u32).max(1);
        let new_height = ((f64::from(height) * scale).round() as u32).max(1);
        (new_width, new_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColorMode;
    use image::DynamicImage;

    fn rgb_buffer(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer {
            image: DynamicImage::new_rgb8(width, height),
            mode: ColorMode::Rgb,
            source_mode: ColorMode::Rgb,
            icc: None,
            exif: None,
        }
    }

    #[test]
    fn test_downscale_preserves_aspect_ratio() {
        let resized = Resizer::resize(rgb_buffer(4000, 3000), &ResizeSpec::new(1920)).unwrap();
        assert_eq!((resized.width(), resized.height()), (1920, 1440));
    }

    #[test]
    fn test_portrait_long_edge_is_height() {
        let resized = Resizer::resize(rgb_buffer(3000, 4000), &ResizeSpec::new(1000)).unwrap();
        assert_eq!((resized.width(), resized.height()), (750, 1000));
    }

    #[test]
    fn test_never_upscales() {
        let resized = Resizer::resize(rgb_buffer(800, 600), &ResizeSpec::new(1920)).unwrap();
        assert_eq!((resized.width(), resized.height()), (800, 600));
    }

    #[test]
    fn test_exact_fit_is_identity() {
        let resized = Resizer::resize(rgb_buffer(1920, 1080), &ResizeSpec::new(1920)).unwrap();
        assert_eq!((resized.width(), resized.height()), (1920, 1080));
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let result = Resizer::resize(rgb_buffer(100, 100), &ResizeSpec::new(0));
        assert!(matches!(result, Err(PipelineError::InvalidResizeTarget(0))));
    }

    #[test]
    fn test_extreme_aspect_never_collapses_to_zero() {
        let (w, h) = Resizer::target_dimensions(10000, 10, 100);
        assert_eq!(w, 100);
        assert_eq!(h, 1);
    }

    #[test]
    fn test_rounding_stays_within_one_pixel() {
        let (w, h) = Resizer::target_dimensions(3333, 2221, 1000);
        assert_eq!(w, 1000);
        let expected = 2221.0 * 1000.0 / 3333.0;
        assert!((f64::from(h) - expected).abs() <= 1.0);
    }
}
