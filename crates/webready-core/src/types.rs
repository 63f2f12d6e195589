//! Core data types for the webready transformation pipeline.
//!
//! A `PixelBuffer` flows through the pipeline stages by value: each stage
//! takes ownership and hands the (possibly replaced) buffer to the next one,
//! so no two stages ever alias the same pixel data.

use image::{ColorType, DynamicImage};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Color mode of a decoded image, as a closed set.
///
/// Only `Rgb` and `Rgba` ever leave the decoder; the other variants describe
/// what the source container held before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Grayscale
    L,
    /// Grayscale with alpha
    La,
    /// Truecolor
    Rgb,
    /// Truecolor with alpha
    Rgba,
    /// Indexed color
    Palette,
}

impl ColorMode {
    /// Classify the mode the `image` crate reports for a decoded buffer.
    pub fn from_color_type(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => Self::L,
            ColorType::La8 | ColorType::La16 => Self::La,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => Self::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => Self::Rgba,
            _ => Self::Rgb,
        }
    }

    /// The mode this one normalizes to before leaving the decoder.
    pub fn normalized(self) -> Self {
        match self {
            Self::Rgba | Self::La => Self::Rgba,
            Self::Rgb | Self::L | Self::Palette => Self::Rgb,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::La)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::La => "LA",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Palette => "P",
        }
    }
}

/// A decoded image owned by exactly one pipeline stage at a time.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    /// Pixel data, always `Rgb8` or `Rgba8` after the decoder.
    pub image: DynamicImage,
    /// Current color mode (`Rgb` or `Rgba` past the decoder).
    pub mode: ColorMode,
    /// Mode the source container declared, before normalization.
    pub source_mode: ColorMode,
    /// ICC profile describing the current pixel data. `None` once pixels
    /// have been converted to sRGB.
    pub icc: Option<Vec<u8>>,
    /// Raw EXIF payload captured at decode time.
    pub exif: Option<Vec<u8>>,
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The larger of width and height.
    pub fn long_edge(&self) -> u32 {
        self.width().max(self.height())
    }

    /// The smaller of width and height.
    pub fn short_edge(&self) -> u32 {
        self.width().min(self.height())
    }
}

/// Supported source container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl SourceFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
        }
    }

    /// Map a filename extension to a format tag, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
        }
    }

    /// Extension used when deriving output filenames.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parse from a user-facing string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Resampling filter used for downscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    #[serde(rename = "catmull-rom")]
    CatmullRom,
    Lanczos3,
}

impl ResampleFilter {
    pub fn to_filter_type(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "triangle" | "bilinear" => Some(Self::Triangle),
            "catmull-rom" | "catmullrom" => Some(Self::CatmullRom),
            "lanczos3" | "lanczos" => Some(Self::Lanczos3),
            _ => None,
        }
    }
}

/// Target geometry for the resizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    /// Requested long-edge length in pixels. Must be positive.
    pub target_long_edge: u32,
    /// Filter applied when downscaling.
    pub filter: ResampleFilter,
}

impl ResizeSpec {
    /// Spec with the default Lanczos3 filter.
    pub fn new(target_long_edge: u32) -> Self {
        Self {
            target_long_edge,
            filter: ResampleFilter::Lanczos3,
        }
    }
}

/// One of the nine positions a watermark can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "top-left" => Some(Self::TopLeft),
            "top-center" | "top" => Some(Self::TopCenter),
            "top-right" => Some(Self::TopRight),
            "center-left" | "left" => Some(Self::CenterLeft),
            "center" => Some(Self::Center),
            "center-right" | "right" => Some(Self::CenterRight),
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-center" | "bottom" => Some(Self::BottomCenter),
            "bottom-right" => Some(Self::BottomRight),
            _ => None,
        }
    }
}

/// Overlay configuration for the watermark compositor.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    /// The overlay image. Treated as fully opaque if it has no alpha channel.
    pub overlay: DynamicImage,
    /// Where the overlay's bounding box is anchored on the base image.
    pub anchor: Anchor,
    /// Overlay shorter edge as a fraction of the base's shorter edge, (0, 1].
    pub scale: f32,
    /// Multiplier applied to the overlay's alpha channel, [0, 1].
    pub opacity: f32,
    /// Distance in pixels between the overlay and the anchored edges.
    pub margin: u32,
    /// Invert the overlay's color channels (alpha untouched).
    pub invert: bool,
}

impl WatermarkSpec {
    pub fn new(overlay: DynamicImage) -> Self {
        Self {
            overlay,
            anchor: Anchor::BottomRight,
            scale: 0.12,
            opacity: 0.7,
            margin: 24,
            invert: false,
        }
    }
}

/// Encoding parameters for the final serialization stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeSpec {
    pub format: OutputFormat,
    /// Codec quality, 1-100.
    pub quality: u8,
    /// Emit progressive scans (JPEG only; ignored for WebP).
    pub progressive: bool,
    /// Spend extra encode time optimizing entropy coding.
    pub optimize: bool,
    /// Discard EXIF and other auxiliary metadata before encoding.
    pub strip_metadata: bool,
    /// Background color RGBA pixels are flattened onto for alpha-less
    /// formats (JPEG).
    pub background: [u8; 3],
}

impl EncodeSpec {
    pub fn new(format: OutputFormat, quality: u8) -> Self {
        Self {
            format,
            quality,
            progressive: true,
            optimize: true,
            strip_metadata: true,
            background: [255, 255, 255],
        }
    }

    pub fn jpeg(quality: u8) -> Self {
        Self::new(OutputFormat::Jpeg, quality)
    }

    pub fn webp(quality: u8) -> Self {
        Self::new(OutputFormat::WebP, quality)
    }
}

/// The encoder's output: bytes plus the measurements callers report on.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Length of `bytes`, measured after any metadata embedding.
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
}

/// One named input blob for a batch run.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Original filename; used to derive the output name and for reporting.
    pub name: String,
    pub bytes: Vec<u8>,
    /// Declared format tag. Used as a fallback when sniffing fails.
    pub format: Option<SourceFormat>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            format: None,
        }
    }
}

/// Why a single batch item failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Stable machine-readable tag, e.g. "corrupt_image".
    pub kind: String,
    /// Human-readable explanation.
    pub message: String,
}

impl From<&PipelineError> for ItemFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Successful output for a single batch item.
#[derive(Debug, Clone)]
pub struct BatchItemOutput {
    /// Derived output filename, unique within the batch.
    pub output_name: String,
    pub image: EncodedImage,
}

/// Per-item result, in input order.
#[derive(Debug, Clone)]
pub struct BatchItemResult {
    pub input_name: String,
    /// Size of the item's source bytes.
    pub input_bytes: u64,
    pub outcome: Result<BatchItemOutput, ItemFailure>,
}

/// Aggregate counters for a batch run. `succeeded + failed` always equals
/// `total`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

/// Everything a batch run produced: ordered per-item results plus totals.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub items: Vec<BatchItemResult>,
    pub stats: BatchStats,
}
