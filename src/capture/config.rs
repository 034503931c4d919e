//! Camera request and capture configuration.
//!
//! A [`CameraRequest`] is what the user asked for (facing mode plus a
//! resolution hint). [`MediaConstraints`] is what actually goes to the
//! device; the relaxed fallback is expressed as fully unconstrained video.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which physical camera a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Selfie / user-facing camera. Captures from it are mirrored.
    Front,
    /// Environment-facing camera.
    #[default]
    Back,
}

impl FacingMode {
    /// Returns the opposite camera.
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }

    /// Whether captured frames from this camera are horizontally mirrored.
    #[inline]
    pub fn mirrors(self) -> bool {
        matches!(self, FacingMode::Front)
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::Front => f.write_str("front"),
            FacingMode::Back => f.write_str("back"),
        }
    }
}

impl FromStr for FacingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(FacingMode::Front),
            "back" | "environment" => Ok(FacingMode::Back),
            other => Err(ConfigError::InvalidFacingMode(other.to_string())),
        }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// A single request to open a camera. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest {
    facing: FacingMode,
    resolution: Option<Resolution>,
}

impl CameraRequest {
    pub fn new(facing: FacingMode, resolution: Option<Resolution>) -> Self {
        Self { facing, resolution }
    }

    /// Returns the requested facing mode.
    #[inline]
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Returns the resolution hint, if any.
    #[inline]
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Same hint, other camera.
    pub fn switched(&self) -> Self {
        Self {
            facing: self.facing.toggled(),
            resolution: self.resolution,
        }
    }

    /// Constraints for the first acquisition attempt.
    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            facing: Some(self.facing),
            ideal_width: self.resolution.map(|r| r.width),
            ideal_height: self.resolution.map(|r| r.height),
        }
    }
}

/// Parameters handed to the device layer.
///
/// `None` means "no preference". All fields `None` is the relaxed,
/// unconstrained request used for the single fallback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaConstraints {
    pub facing: Option<FacingMode>,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl MediaConstraints {
    /// Unconstrained video.
    pub fn relaxed() -> Self {
        Self::default()
    }

    pub fn is_relaxed(&self) -> bool {
        *self == Self::relaxed()
    }
}

/// Output encoding for captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    #[default]
    Jpeg,
    Png,
}

impl ImageEncoding {
    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Png => "image/png",
        }
    }

    /// Container format written by this encoding.
    pub fn format(self) -> image::ImageFormat {
        match self {
            ImageEncoding::Jpeg => image::ImageFormat::Jpeg,
            ImageEncoding::Png => image::ImageFormat::Png,
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
        }
    }
}

/// Configuration for the capture controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera opened by "open camera" when no facing mode is given.
    pub facing: FacingMode,
    /// Ideal resolution hint. `None` leaves the choice to the device.
    pub resolution: Option<Resolution>,
    /// Encoding of captured frames.
    pub encoding: ImageEncoding,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Native device index used for the front camera.
    pub front_device_index: u32,
    /// Native device index used for the back camera.
    pub back_device_index: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Back,
            resolution: Some(Resolution::default()),
            encoding: ImageEncoding::Jpeg,
            jpeg_quality: 92,
            front_device_index: 0,
            back_device_index: 1,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the given resolution hint.
    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            resolution: Some(Resolution::new(width, height)),
            ..Default::default()
        }
    }

    /// Builds the request for the configured default camera.
    pub fn request(&self) -> CameraRequest {
        CameraRequest::new(self.facing, self.resolution)
    }

    /// Builds a request for a specific camera with the configured hint.
    pub fn request_for(&self, facing: FacingMode) -> CameraRequest {
        CameraRequest::new(facing, self.resolution)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.is_some_and(|r| r.is_empty()) {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid resolution hint")]
    InvalidDimensions,
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    #[error("unknown facing mode: {0}")]
    InvalidFacingMode(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Mock analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Simulated processing time before a report is returned.
    pub latency_ms: u64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            latency_ms: 3500,
            seed: None,
        }
    }
}

/// Local storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one file per stored key.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".pureplate"),
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        Ok(config)
    }
}
