//! Image decoding and color normalization.
//!
//! Every decode entry point returns a `PixelBuffer` that downstream stages
//! can rely on: mode is `Rgb` or `Rgba`, EXIF orientation has been applied,
//! and pixels are sRGB whenever the embedded ICC profile could be converted.
//! Images without a profile are assumed to be sRGB already.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder as _, ImageFormat, ImageReader};
use moxcms::{ColorProfile, Layout, TransformOptions};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ColorMode, PixelBuffer, SourceFormat};

use super::metadata;

/// Decode a JPEG blob into a normalized buffer.
pub fn decode_jpeg(bytes: &[u8]) -> PipelineResult<PixelBuffer> {
    decode_as(bytes, SourceFormat::Jpeg)
}

/// Decode a PNG blob into a normalized buffer.
pub fn decode_png(bytes: &[u8]) -> PipelineResult<PixelBuffer> {
    decode_as(bytes, SourceFormat::Png)
}

/// Decode a WebP blob into a normalized buffer.
pub fn decode_webp(bytes: &[u8]) -> PipelineResult<PixelBuffer> {
    decode_as(bytes, SourceFormat::WebP)
}

/// Decode a TIFF blob into a normalized buffer.
pub fn decode_tiff(bytes: &[u8]) -> PipelineResult<PixelBuffer> {
    decode_as(bytes, SourceFormat::Tiff)
}

/// Decode `bytes` as `format`, then normalize orientation, color mode, and
/// color space.
pub fn decode_as(bytes: &[u8], format: SourceFormat) -> PipelineResult<PixelBuffer> {
    let image_format = match format {
        SourceFormat::Jpeg => ImageFormat::Jpeg,
        SourceFormat::Png => ImageFormat::Png,
        SourceFormat::WebP => ImageFormat::WebP,
        SourceFormat::Tiff => ImageFormat::Tiff,
    };

    let reader = ImageReader::with_format(Cursor::new(bytes), image_format);
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| PipelineError::CorruptImage(e.to_string()))?;

    // Pull auxiliary data off the decoder before it is consumed.
    let icc = decoder.icc_profile().ok().flatten();
    let exif = decoder.exif_metadata().ok().flatten();
    let mut source_mode = ColorMode::from_color_type(decoder.color_type());
    if format == SourceFormat::Png && png_is_indexed(bytes) {
        source_mode = ColorMode::Palette;
    }

    let image =
        DynamicImage::from_decoder(decoder).map_err(|e| PipelineError::CorruptImage(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::CorruptImage(
            "decoded buffer has zero dimension".to_string(),
        ));
    }

    normalize(image, source_mode, icc, exif)
}

/// Normalize a freshly decoded image into the pipeline's working form.
fn normalize(
    image: DynamicImage,
    source_mode: ColorMode,
    icc: Option<Vec<u8>>,
    exif: Option<Vec<u8>>,
) -> PipelineResult<PixelBuffer> {
    // Orientation first, while we still have the raw EXIF payload.
    let orientation = exif
        .as_deref()
        .and_then(metadata::orientation_from_exif)
        .unwrap_or(1);
    let image = apply_orientation(image, orientation);
    // A re-embedded payload would still carry the old orientation tag and
    // make viewers rotate twice, so drop it once applied.
    let exif = if orientation == 1 { exif } else { None };

    // Collapse to the working mode set before any color math.
    let image = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    let mode = if image.color().has_alpha() {
        ColorMode::Rgba
    } else {
        ColorMode::Rgb
    };

    let (image, icc) = match icc {
        Some(profile) => convert_to_srgb(image, profile),
        None => (image, None),
    };

    Ok(PixelBuffer {
        image,
        mode,
        source_mode,
        icc,
        exif,
    })
}

/// Convert pixels tagged with `profile` to sRGB.
///
/// On success the returned profile is `None` (pixels are sRGB now). If the
/// profile parses but the transform cannot run, pixels are left alone and
/// the profile is kept so the encoder can re-embed it. Unparseable profiles
/// are dropped and the image is assumed sRGB, matching how lenient viewers
/// treat broken tags.
fn convert_to_srgb(image: DynamicImage, profile: Vec<u8>) -> (DynamicImage, Option<Vec<u8>>) {
    let source = match ColorProfile::new_from_slice(&profile) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Unparseable ICC profile ({e}), assuming sRGB");
            return (image, None);
        }
    };
    let srgb = ColorProfile::new_srgb();
    let layout = if image.color().has_alpha() {
        Layout::Rgba
    } else {
        Layout::Rgb
    };
    let transform =
        match source.create_transform_8bit(layout, &srgb, layout, TransformOptions::default()) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("ICC transform unavailable ({e}), keeping source profile");
                return (image, Some(profile));
            }
        };

    match image {
        DynamicImage::ImageRgb8(mut rgb) => {
            let src = rgb.as_raw().to_vec();
            match transform.transform(&src, &mut *rgb) {
                Ok(()) => (DynamicImage::ImageRgb8(rgb), None),
                Err(e) => {
                    tracing::warn!("ICC transform failed ({e}), keeping source profile");
                    (DynamicImage::ImageRgb8(rgb), Some(profile))
                }
            }
        }
        DynamicImage::ImageRgba8(mut rgba) => {
            let src = rgba.as_raw().to_vec();
            match transform.transform(&src, &mut *rgba) {
                Ok(()) => (DynamicImage::ImageRgba8(rgba), None),
                Err(e) => {
                    tracing::warn!("ICC transform failed ({e}), keeping source profile");
                    (DynamicImage::ImageRgba8(rgba), Some(profile))
                }
            }
        }
        other => (other, Some(profile)),
    }
}

/// Apply an EXIF orientation (1-8) to the decoded pixels.
fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// PNG IHDR color type 3 means indexed color. The IHDR layout is fixed, so
/// the color type always sits at byte 25 of a well-formed file.
fn png_is_indexed(bytes: &[u8]) -> bool {
    bytes.len() > 25 && bytes[25] == 3
}
