//! Watermark compositing: scale, position, and alpha-over an overlay onto a
//! base buffer.

use image::{imageops, DynamicImage, RgbaImage};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Anchor, ColorMode, PixelBuffer, ResampleFilter, WatermarkSpec};

/// Position along one axis of the base image.
#[derive(Debug, Clone, Copy)]
enum AxisPos {
    Start,
    Center,
    End,
}

/// Alpha-composites a configured overlay onto base buffers.
pub struct Compositor;

impl Compositor {
    /// Composite the spec's overlay onto `base`.
    ///
    /// The overlay is scaled so its shorter edge equals `spec.scale` times
    /// the base's shorter edge, using the same `filter` the resizer ran
    /// with. An RGB base stays RGB when the overlay is fully opaque;
    /// otherwise it is promoted to RGBA before blending.
    pub fn composite(
        mut base: PixelBuffer,
        spec: &WatermarkSpec,
        filter: ResampleFilter,
    ) -> PipelineResult<PixelBuffer> {
        if spec.overlay.width() == 0 || spec.overlay.height() == 0 {
            return Err(PipelineError::InvalidWatermark(
                "overlay has zero dimension".to_string(),
            ));
        }
        if !(spec.scale > 0.0 && spec.scale <= 1.0) {
            return Err(PipelineError::InvalidWatermark(format!(
                "relative scale must be in (0, 1], got {}",
                spec.scale
            )));
        }

        // An overlay without alpha is treated as fully opaque, which
        // to_rgba8 gives us for free (alpha filled with 255).
        let mut overlay = spec.overlay.to_rgba8();
        if spec.invert {
            invert_colors(&mut overlay);
        }

        let overlay = scale_overlay(overlay, spec.scale, base.short_edge(), filter);

        let opacity = spec.opacity.clamp(0.0, 1.0);
        let mut overlay = overlay;
        if opacity < 1.0 {
            for pixel in overlay.pixels_mut() {
                pixel[3] = (f32::from(pixel[3]) * opacity).round() as u8;
            }
        }

        let (x, y) = anchor_offsets(
            (base.width(), base.height()),
            (overlay.width(), overlay.height()),
            spec.margin,
            spec.anchor,
        );
        tracing::trace!(
            "Compositing {}x{} overlay at ({}, {})",
            overlay.width(),
            overlay.height(),
            x,
            y
        );

        let fully_opaque = overlay.pixels().all(|p| p[3] == u8::MAX);
        if base.mode == ColorMode::Rgb && fully_opaque {
            let mut rgb = base.image.into_rgb8();
            let overlay_rgb = DynamicImage::ImageRgba8(overlay).into_rgb8();
            imageops::replace(&mut rgb, &overlay_rgb, x, y);
            base.image = DynamicImage::ImageRgb8(rgb);
        } else {
            let mut rgba = base.image.into_rgba8();
            imageops::overlay(&mut rgba, &overlay, x, y);
            base.image = DynamicImage::ImageRgba8(rgba);
            base.mode = ColorMode::Rgba;
        }
        Ok(base)
    }
}

/// Scale the overlay so its shorter edge matches the requested fraction of
/// the base's shorter edge, preserving the overlay's aspect ratio.
fn scale_overlay(
    overlay: RgbaImage,
    scale: f32,
    base_short_edge: u32,
    filter: ResampleFilter,
) -> RgbaImage {
    let overlay_short = overlay.width().min(overlay.height());
    let target_short = ((f64::from(base_short_edge) * f64::from(scale)).round() as u32).max(1);
    if overlay_short == target_short {
        return overlay;
    }
    let factor = f64::from(target_short) / f64::from(overlay_short);
    let new_width = ((f64::from(overlay.width()) * factor).round() as u32).max(1);
    let new_height = ((f64::from(overlay.height()) * factor).round() as u32).max(1);
    imageops::resize(&overlay, new_width, new_height, filter.to_filter_type())
}

/// Invert the color channels, leaving alpha untouched.
fn invert_colors(overlay: &mut RgbaImage) {
    for pixel in overlay.pixels_mut() {
        pixel[0] = u8::MAX - pixel[0];
        pixel[1] = u8::MAX - pixel[1];
        pixel[2] = u8::MAX - pixel[2];
    }
}

/// Top-left offset for the overlay's bounding box at the given anchor.
///
/// The margin shrinks (down to 0, never negative) when the overlay would
/// not otherwise fit, and the overlay never starts outside the base.
fn anchor_offsets(
    base: (u32, u32),
    overlay: (u32, u32),
    margin: u32,
    anchor: Anchor,
) -> (i64, i64) {
    let (h_pos, v_pos) = match anchor {
        Anchor::TopLeft => (AxisPos::Start, AxisPos::Start),
        Anchor::TopCenter => (AxisPos::Center, AxisPos::Start),
        Anchor::TopRight => (AxisPos::End, AxisPos::Start),
        Anchor::CenterLeft => (AxisPos::Start, AxisPos::Center),
        Anchor::Center => (AxisPos::Center, AxisPos::Center),
        Anchor::CenterRight => (AxisPos::End, AxisPos::Center),
        Anchor::BottomLeft => (AxisPos::Start, AxisPos::End),
        Anchor::BottomCenter => (AxisPos::Center, AxisPos::End),
        Anchor::BottomRight => (AxisPos::End, AxisPos::End),
    };
    (
        axis_offset(base.0, overlay.0, margin, h_pos),
        axis_offset(base.1, overlay.1, margin, v_pos),
    )
}

fn axis_offset(base: u32, overlay: u32, margin: u32, pos: AxisPos) -> i64 {
    let max_offset = i64::from(base.saturating_sub(overlay));
    let margin = i64::from(margin).min(max_offset);
    match pos {
        AxisPos::Start => margin,
        AxisPos::Center => max_offset / 2,
        AxisPos::End => max_offset - margin,
    }
}
