//! Crunch job configuration
//!
//! Defines the settings a batch runs with and their validation.

use crate::host::{CompressionState, ImportSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum texture dimension applied to every crunched texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MaxTextureSize {
    #[default]
    S512,
    S1024,
    S2048,
}

impl MaxTextureSize {
    pub const ALL: [MaxTextureSize; 3] = [Self::S512, Self::S1024, Self::S2048];

    /// Size in pixels
    pub fn pixels(self) -> u32 {
        match self {
            Self::S512 => 512,
            Self::S1024 => 1024,
            Self::S2048 => 2048,
        }
    }

    /// Position in [`MaxTextureSize::ALL`]
    pub fn index(self) -> usize {
        match self {
            Self::S512 => 0,
            Self::S1024 => 1,
            Self::S2048 => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl TryFrom<u32> for MaxTextureSize {
    type Error = ConfigError;

    fn try_from(pixels: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.pixels() == pixels)
            .ok_or_else(|| ConfigError::InvalidMaxSize(pixels.to_string()))
    }
}

impl From<MaxTextureSize> for u32 {
    fn from(size: MaxTextureSize) -> Self {
        size.pixels()
    }
}

impl FromStr for MaxTextureSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidMaxSize(s.to_string()))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for MaxTextureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pixels())
    }
}

/// Which textures a job looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetScope {
    /// Every texture under `Assets`
    #[default]
    All,
    /// Only textures under `Assets/Resources`
    ResourcesOnly,
}

/// Configuration for a crunch job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Compression quality, 0-100
    pub compression_quality: u8,

    /// Assets processed per tick before yielding
    pub processing_speed: u32,

    /// Maximum texture size written into import settings
    pub max_size: MaxTextureSize,

    /// Which assets to query
    pub scope: AssetScope,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            compression_quality: 75,
            processing_speed: 10,
            max_size: MaxTextureSize::S512,
            scope: AssetScope::All,
        }
    }
}

impl JobConfig {
    pub const MAX_QUALITY: u8 = 100;

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression_quality > Self::MAX_QUALITY {
            return Err(ConfigError::QualityOutOfRange(self.compression_quality as u32));
        }

        if self.processing_speed == 0 {
            return Err(ConfigError::SpeedOutOfRange(self.processing_speed));
        }

        Ok(())
    }

    /// Compression state a texture must already have to be skipped
    pub fn target_compression(&self) -> CompressionState {
        CompressionState {
            quality: self.compression_quality,
            crunched: true,
        }
    }

    /// Import settings written to every processed texture
    pub fn target_import_settings(&self) -> ImportSettings {
        ImportSettings {
            compressed: true,
            crunched: true,
            quality: self.compression_quality,
            max_size: self.max_size,
            readable: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Compression quality must be 0-100, got {0}")]
    QualityOutOfRange(u32),

    #[error("Processing speed must be at least 1 asset per tick, got {0}")]
    SpeedOutOfRange(u32),

    #[error("Max texture size must be one of 512, 1024, 2048, got '{0}'")]
    InvalidMaxSize(String),
}
