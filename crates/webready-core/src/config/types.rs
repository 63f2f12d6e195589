//! Sub-configuration structs with web-export defaults.

use serde::{Deserialize, Serialize};

use crate::types::{
    Anchor, EncodeSpec, OutputFormat, ResampleFilter, ResizeSpec, WatermarkSpec,
};

/// Named long-edge presets for common destinations.
pub const PRESETS: &[(&str, u32)] = &[
    ("web", 1920),
    ("portfolio", 2048),
    ("instagram", 1080),
    ("instagram-portrait", 1350),
    ("instagram-story", 1920),
];

/// Resize settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Named preset for the long edge. Ignored when `long_edge` is set.
    pub preset: String,

    /// Explicit long-edge target in pixels. Overrides `preset`.
    pub long_edge: Option<u32>,

    /// Resampling filter: nearest, triangle, catmull-rom, lanczos3
    pub filter: String,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            preset: "web".to_string(),
            long_edge: None,
            filter: "lanczos3".to_string(),
        }
    }
}

impl ResizeConfig {
    /// Resolve the effective long-edge target, explicit value first.
    pub fn target_long_edge(&self) -> Option<u32> {
        self.long_edge.or_else(|| {
            PRESETS
                .iter()
                .find(|(name, _)| *name == self.preset)
                .map(|(_, edge)| *edge)
        })
    }

    pub fn to_spec(&self) -> Option<ResizeSpec> {
        Some(ResizeSpec {
            target_long_edge: self.target_long_edge()?,
            filter: ResampleFilter::parse(&self.filter)?,
        })
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format ("jpeg" or "webp")
    pub format: String,

    /// Codec quality, 1-100
    pub quality: u8,

    /// Emit progressive JPEG scans
    pub progressive: bool,

    /// Spend extra encode time on entropy optimization
    pub optimize: bool,

    /// Discard EXIF before encoding
    pub strip_metadata: bool,

    /// Appended to each output stem, e.g. "_web"
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: 85,
            progressive: true,
            optimize: true,
            strip_metadata: true,
            suffix: "_web".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn to_spec(&self) -> Option<EncodeSpec> {
        Some(EncodeSpec {
            format: OutputFormat::parse(&self.format)?,
            quality: self.quality,
            progressive: self.progressive,
            optimize: self.optimize,
            strip_metadata: self.strip_metadata,
            background: [255, 255, 255],
        })
    }
}

/// Watermark settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Whether to composite a watermark at all
    pub enabled: bool,

    /// Path to the overlay image (supports ~ expansion)
    pub path: String,

    /// Anchor position, e.g. "bottom-right"
    pub position: String,

    /// Overlay shorter edge as a fraction of the base's shorter edge, (0, 1]
    pub scale: f32,

    /// Alpha multiplier, 0.0-1.0
    pub opacity: f32,

    /// Margin from the anchored edges in pixels
    pub margin: u32,

    /// Invert the overlay's colors before compositing
    pub invert: bool,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            position: "bottom-right".to_string(),
            scale: 0.12,
            opacity: 0.7,
            margin: 24,
            invert: false,
        }
    }
}

impl WatermarkConfig {
    /// The overlay path with ~ expanded.
    pub fn resolved_path(&self) -> std::path::PathBuf {
        let expanded = shellexpand::tilde(&self.path);
        std::path::PathBuf::from(expanded.into_owned())
    }

    /// Build a spec from these settings and an already-loaded overlay.
    pub fn to_spec(&self, overlay: image::DynamicImage) -> Option<WatermarkSpec> {
        Some(WatermarkSpec {
            overlay,
            anchor: Anchor::parse(&self.position)?,
            scale: self.scale,
            opacity: self.opacity,
            margin: self.margin,
            invert: self.invert,
        })
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_resolution() {
        let config = ResizeConfig::default();
        assert_eq!(config.target_long_edge(), Some(1920));

        let portfolio = ResizeConfig {
            preset: "portfolio".to_string(),
            ..Default::default()
        };
        assert_eq!(portfolio.target_long_edge(), Some(2048));
    }

    #[test]
    fn test_explicit_long_edge_overrides_preset() {
        let config = ResizeConfig {
            preset: "instagram".to_string(),
            long_edge: Some(640),
            ..Default::default()
        };
        assert_eq!(config.target_long_edge(), Some(640));
    }

    #[test]
    fn test_unknown_preset_resolves_to_none() {
        let config = ResizeConfig {
            preset: "billboard".to_string(),
            ..Default::default()
        };
        assert_eq!(config.target_long_edge(), None);
    }

    #[test]
    fn test_output_config_to_spec() {
        let spec = OutputConfig::default().to_spec().unwrap();
        assert_eq!(spec.format, OutputFormat::Jpeg);
        assert_eq!(spec.quality, 85);
        assert!(spec.progressive);
        assert!(spec.strip_metadata);
    }

    #[test]
    fn test_watermark_path_tilde_expansion() {
        let home = WatermarkConfig {
            path: "~/brand/logo.png".to_string(),
            ..Default::default()
        };
        let resolved = home.resolved_path();
        assert!(!resolved.to_string_lossy().starts_with('~'));
        assert!(resolved.ends_with("brand/logo.png"));

        let absolute = WatermarkConfig {
            path: "/srv/assets/logo.png".to_string(),
            ..Default::default()
        };
        assert_eq!(
            absolute.resolved_path(),
            std::path::PathBuf::from("/srv/assets/logo.png")
        );
    }

    #[test]
    fn test_watermark_config_to_spec() {
        let overlay = image::DynamicImage::new_rgba8(10, 10);
        let spec = WatermarkConfig::default().to_spec(overlay).unwrap();
        assert_eq!(spec.anchor, Anchor::BottomRight);
        assert!((spec.scale - 0.12).abs() < f32::EPSILON);
    }
}
