//! Final serialization: JPEG via mozjpeg, lossy WebP via libwebp.
//!
//! Both paths produce an in-memory byte sequence and measure it; nothing
//! here touches the filesystem. ICC and EXIF payloads still present on the
//! buffer are re-embedded into the encoded container.

use image::{DynamicImage, RgbImage, RgbaImage};
use img_parts::{Bytes, ImageEXIF, ImageICC};
use mozjpeg::{ColorSpace, Compress};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ColorMode, EncodeSpec, EncodedImage, OutputFormat, PixelBuffer};

/// Encode a buffer as baseline or progressive JPEG.
///
/// RGBA input is flattened onto the spec's background color first since
/// JPEG has no alpha channel.
pub fn encode_jpeg(buffer: &PixelBuffer, spec: &EncodeSpec) -> PipelineResult<EncodedImage> {
    let (width, height) = (buffer.width(), buffer.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::EncodeFailure(
            "zero-dimension buffer".to_string(),
        ));
    }

    let rgb: RgbImage = match &buffer.image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        DynamicImage::ImageRgba8(rgba) => flatten_onto(rgba, spec.background),
        other => other.to_rgb8(),
    };

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(f32::from(clamp_quality(spec.quality)));
    if spec.progressive {
        comp.set_progressive_mode();
    }
    comp.set_optimize_coding(spec.optimize);
    if spec.optimize {
        comp.set_optimize_scans(true);
    }

    let estimated = (width as usize * height as usize * 3 / 10).max(4096);
    let mut output = Vec::with_capacity(estimated);
    {
        let mut started = comp
            .start_compress(&mut output)
            .map_err(|e| PipelineError::EncodeFailure(format!("mozjpeg start: {e:?}")))?;
        let stride = width as usize * 3;
        for row in rgb.as_raw().chunks(stride) {
            started
                .write_scanlines(row)
                .map_err(|e| PipelineError::EncodeFailure(format!("mozjpeg scanlines: {e:?}")))?;
        }
        started
            .finish()
            .map_err(|e| PipelineError::EncodeFailure(format!("mozjpeg finish: {e:?}")))?;
    }

    let bytes = embed_metadata(output, OutputFormat::Jpeg, buffer)?;
    Ok(EncodedImage {
        byte_size: bytes.len() as u64,
        bytes,
        format: OutputFormat::Jpeg,
        width,
        height,
    })
}

/// Encode a buffer as lossy WebP. Alpha is preserved natively.
pub fn encode_webp(buffer: &PixelBuffer, spec: &EncodeSpec) -> PipelineResult<EncodedImage> {
    let (width, height) = (buffer.width(), buffer.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::EncodeFailure(
            "zero-dimension buffer".to_string(),
        ));
    }

    let rgba;
    let rgb;
    let encoder = if buffer.mode == ColorMode::Rgba {
        rgba = buffer.image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height)
    } else {
        rgb = buffer.image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height)
    };

    let mut config = webp::WebPConfig::new()
        .map_err(|_| PipelineError::EncodeFailure("libwebp config init".to_string()))?;
    config.quality = f32::from(clamp_quality(spec.quality));
    // Method 6 is the slowest, best rate-distortion setting.
    config.method = if spec.optimize { 6 } else { 4 };

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| PipelineError::EncodeFailure(format!("libwebp: {e:?}")))?;

    let bytes = embed_metadata(memory.to_vec(), OutputFormat::WebP, buffer)?;
    Ok(EncodedImage {
        byte_size: bytes.len() as u64,
        bytes,
        format: OutputFormat::WebP,
        width,
        height,
    })
}

fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

/// Flatten RGBA pixels onto an opaque background.
fn flatten_onto(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = f32::from(src[3]) / 255.0;
        for channel in 0..3 {
            let blended =
                f32::from(src[channel]) * alpha + f32::from(background[channel]) * (1.0 - alpha);
            dst[channel] = blended.round() as u8;
        }
    }
    out
}

/// Re-embed ICC and EXIF payloads into the encoded container.
fn embed_metadata(
    encoded: Vec<u8>,
    format: OutputFormat,
    buffer: &PixelBuffer,
) -> PipelineResult<Vec<u8>> {
    if buffer.icc.is_none() && buffer.exif.is_none() {
        return Ok(encoded);
    }

    let icc = buffer.icc.as_ref().map(|b| Bytes::copy_from_slice(b));
    let exif = buffer.exif.as_ref().map(|b| Bytes::copy_from_slice(b));
    let mut out = Vec::with_capacity(encoded.len());
    match format {
        OutputFormat::Jpeg => {
            let mut jpeg = img_parts::jpeg::Jpeg::from_bytes(encoded.into())
                .map_err(|e| PipelineError::EncodeFailure(format!("jpeg container: {e}")))?;
            if icc.is_some() {
                jpeg.set_icc_profile(icc);
            }
            if exif.is_some() {
                jpeg.set_exif(exif);
            }
            jpeg.encoder()
                .write_to(&mut out)
                .map_err(|e| PipelineError::EncodeFailure(format!("jpeg container: {e}")))?;
        }
        OutputFormat::WebP => {
            let mut webp = img_parts::webp::WebP::from_bytes(encoded.into())
                .map_err(|e| PipelineError::EncodeFailure(format!("webp container: {e}")))?;
            if icc.is_some() {
                webp.set_icc_profile(icc);
            }
            if exif.is_some() {
                webp.set_exif(exif);
            }
            webp.encoder()
                .write_to(&mut out)
                .map_err(|e| PipelineError::EncodeFailure(format!("webp container: {e}")))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_buffer(width: u32, height: u32) -> PixelBuffer {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        PixelBuffer {
            image: DynamicImage::ImageRgb8(image),
            mode: ColorMode::Rgb,
            source_mode: ColorMode::Rgb,
            icc: None,
            exif: None,
        }
    }

    fn rgba_buffer(width: u32, height: u32, pixel: [u8; 4]) -> PixelBuffer {
        let image = RgbaImage::from_pixel(width, height, image::Rgba(pixel));
        PixelBuffer {
            image: DynamicImage::ImageRgba8(image),
            mode: ColorMode::Rgba,
            source_mode: ColorMode::Rgba,
            icc: None,
            exif: None,
        }
    }

    #[test]
    fn test_jpeg_output_is_jpeg() {
        let encoded = encode_jpeg(&gradient_buffer(64, 48), &EncodeSpec::jpeg(80)).unwrap();
        assert_eq!(&encoded.bytes[0..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(encoded.format, OutputFormat::Jpeg);
        assert_eq!((encoded.width, encoded.height), (64, 48));
        assert_eq!(encoded.byte_size, encoded.bytes.len() as u64);
    }

    #[test]
    fn test_jpeg_roundtrips_through_decoder() {
        let encoded = encode_jpeg(&gradient_buffer(100, 75), &EncodeSpec::jpeg(90)).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 75));
    }

    #[test]
    fn test_webp_output_is_webp() {
        let encoded = encode_webp(&gradient_buffer(64, 48), &EncodeSpec::webp(80)).unwrap();
        assert_eq!(&encoded.bytes[0..4], b"RIFF");
        assert_eq!(&encoded.bytes[8..12], b"WEBP");
        assert_eq!((encoded.width, encoded.height), (64, 48));
    }

    #[test]
    fn test_webp_roundtrips_through_decoder() {
        let encoded = encode_webp(&gradient_buffer(80, 60), &EncodeSpec::webp(75)).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 60));
    }

    #[test]
    fn test_lower_quality_means_fewer_bytes() {
        let buffer = gradient_buffer(256, 256);
        let low = encode_jpeg(&buffer, &EncodeSpec::jpeg(30)).unwrap();
        let high = encode_jpeg(&buffer, &EncodeSpec::jpeg(95)).unwrap();
        assert!(low.byte_size < high.byte_size);
    }

    #[test]
    fn test_jpeg_flattens_alpha_onto_white() {
        let transparent = flatten_onto(
            &RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 0])),
            [255, 255, 255],
        );
        assert_eq!(transparent.get_pixel(0, 0).0, [255, 255, 255]);

        let opaque = flatten_onto(
            &RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255])),
            [255, 255, 255],
        );
        assert_eq!(opaque.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_rgba_buffer_encodes_to_jpeg() {
        let encoded =
            encode_jpeg(&rgba_buffer(32, 32, [0, 0, 255, 128]), &EncodeSpec::jpeg(85)).unwrap();
        assert_eq!(&encoded.bytes[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_quality_is_clamped() {
        let buffer = gradient_buffer(16, 16);
        assert!(encode_jpeg(&buffer, &EncodeSpec::jpeg(0)).is_ok());
        assert!(encode_webp(&buffer, &EncodeSpec::webp(255)).is_ok());
    }

    #[test]
    fn test_exif_payload_is_embedded_in_jpeg() {
        let mut buffer = gradient_buffer(16, 16);
        buffer.exif = Some(vec![0x4D, 0x4D, 0x00, 0x2A, 0, 0, 0, 8]);
        let encoded = encode_jpeg(&buffer, &EncodeSpec::jpeg(80)).unwrap();
        let container = img_parts::jpeg::Jpeg::from_bytes(encoded.bytes.into()).unwrap();
        assert!(container.exif().is_some());
    }
}
