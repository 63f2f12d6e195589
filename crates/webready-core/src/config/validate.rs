//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::{Anchor, OutputFormat, ResampleFilter};

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.resize.target_long_edge().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "resize.preset '{}' is unknown and resize.long_edge is unset",
                self.resize.preset
            )));
        }
        if self.resize.target_long_edge() == Some(0) {
            return Err(ConfigError::ValidationError(
                "resize.long_edge must be > 0".into(),
            ));
        }
        if ResampleFilter::parse(&self.resize.filter).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "resize.filter '{}' is not a known filter",
                self.resize.filter
            )));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format '{}' is not a supported output format",
                self.output.format
            )));
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::ValidationError(
                "output.quality must be between 1 and 100".into(),
            ));
        }
        if self.watermark.enabled {
            if self.watermark.path.is_empty() {
                return Err(ConfigError::ValidationError(
                    "watermark.path must be set when watermark.enabled is true".into(),
                ));
            }
            if Anchor::parse(&self.watermark.position).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "watermark.position '{}' is not a known anchor",
                    self.watermark.position
                )));
            }
            if self.watermark.scale <= 0.0 || self.watermark.scale > 1.0 {
                return Err(ConfigError::ValidationError(
                    "watermark.scale must be in (0.0, 1.0]".into(),
                ));
            }
            if self.watermark.opacity < 0.0 || self.watermark.opacity > 1.0 {
                return Err(ConfigError::ValidationError(
                    "watermark.opacity must be between 0.0 and 1.0".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_preset() {
        let mut config = Config::default();
        config.resize.preset = "billboard".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("billboard"));
    }

    #[test]
    fn test_validate_rejects_zero_long_edge() {
        let mut config = Config::default();
        config.resize.long_edge = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("long_edge"));
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let mut config = Config::default();
        config.output.quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));

        config.output.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_enabled_watermark_without_path() {
        let mut config = Config::default();
        config.watermark.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watermark.path"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_watermark_scale() {
        let mut config = Config::default();
        config.watermark.enabled = true;
        config.watermark.path = "logo.png".to_string();
        config.watermark.scale = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scale"));
    }

    #[test]
    fn test_disabled_watermark_skips_watermark_checks() {
        let mut config = Config::default();
        config.watermark.scale = 9.0;
        assert!(config.validate().is_ok());
    }
}
