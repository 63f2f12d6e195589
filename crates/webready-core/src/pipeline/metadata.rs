//! Auxiliary metadata handling: EXIF parsing and stripping.
//!
//! The stripper discards non-pixel metadata; the ICC profile on a buffer is
//! never touched here because it is required for correct color
//! reproduction regardless of the strip flag.

use exif::{In, Reader, Tag, Value};

use crate::types::PixelBuffer;

/// Strips auxiliary metadata from pixel buffers.
pub struct MetadataStripper;

impl MetadataStripper {
    /// Clear the EXIF payload when `strip` is set; pass through otherwise.
    pub fn apply(buffer: &mut PixelBuffer, strip: bool) {
        if strip && buffer.exif.take().is_some() {
            tracing::trace!("Stripped EXIF payload");
        }
    }
}

/// Parse the orientation tag (1-8) from a raw EXIF payload.
///
/// Malformed payloads or missing tags yield `None` and the caller treats
/// the image as already upright.
pub fn orientation_from_exif(raw: &[u8]) -> Option<u32> {
    let exif = Reader::new().read_raw(raw.to_vec()).ok()?;
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    match &field.value {
        Value::Short(v) => v.first().map(|&x| u32::from(x)).filter(|&x| (1..=8).contains(&x)),
        Value::Long(v) => v.first().copied().filter(|&x| (1..=8).contains(&x)),
        _ => None,
    }
}
