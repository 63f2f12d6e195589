//! Error types for the webready transformation pipeline.
//!
//! Pipeline failures are per-item and deterministic: the same input bytes
//! always fail the same way, so nothing here models retries or transient
//! conditions. The batch orchestrator catches `PipelineError` at item
//! granularity and keeps going.

use thiserror::Error;

/// Top-level error type for webready operations.
#[derive(Error, Debug)]
pub enum WebReadyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// A failure in one stage of the transformation pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input bytes don't match any supported source codec
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// Decoding produced an incomplete or zero-dimension buffer
    #[error("corrupt image: {0}")]
    CorruptImage(String),

    /// Requested long edge is not a positive length
    #[error("invalid resize target: long edge must be positive, got {0}")]
    InvalidResizeTarget(u32),

    /// Watermark overlay or its parameters are unusable
    #[error("invalid watermark: {0}")]
    InvalidWatermark(String),

    /// Requested output format has no registered encoder
    #[error("unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    /// The output codec rejected the buffer
    #[error("encode failure: {0}")]
    EncodeFailure(String),
}

impl PipelineError {
    /// Stable machine-readable tag for batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::CorruptImage(_) => "corrupt_image",
            Self::InvalidResizeTarget(_) => "invalid_resize_target",
            Self::InvalidWatermark(_) => "invalid_watermark",
            Self::UnsupportedOutputFormat(_) => "unsupported_output_format",
            Self::EncodeFailure(_) => "encode_failure",
        }
    }
}

/// Convenience type alias for webready results.
pub type Result<T> = std::result::Result<T, WebReadyError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
