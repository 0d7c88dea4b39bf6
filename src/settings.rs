//! Persisted user settings
//!
//! Stores crunch preferences in ~/.config/texcrunch/settings.json

use crate::config::{AssetScope, JobConfig, MaxTextureSize};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// User settings for texcrunch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Compression quality, 0-100
    #[serde(default = "default_quality")]
    pub compression_quality: u8,

    /// Assets crunched per tick
    #[serde(default = "default_speed")]
    pub processing_speed: u32,

    /// Max texture size written into import settings
    #[serde(default)]
    pub max_size: MaxTextureSize,

    /// Only crunch textures under Assets/Resources
    #[serde(default)]
    pub resources_only: bool,

    /// Project directory of the last crunch
    #[serde(default)]
    pub last_project: String,
}

fn default_quality() -> u8 {
    JobConfig::default().compression_quality
}

fn default_speed() -> u32 {
    JobConfig::default().processing_speed
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compression_quality: default_quality(),
            processing_speed: default_speed(),
            max_size: MaxTextureSize::default(),
            resources_only: false,
            last_project: String::new(),
        }
    }
}

impl Settings {
    /// Get the config directory path (~/.config/texcrunch)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("texcrunch");

        Ok(config_dir)
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Load settings from disk, or return defaults if they can't be read
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not load settings: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Try to load settings, returning error on failure
    pub fn try_load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    /// Load settings from a specific file; a missing file gives defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    /// Save settings to a specific file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Job configuration described by these settings
    pub fn to_job_config(&self) -> JobConfig {
        JobConfig {
            compression_quality: self.compression_quality,
            processing_speed: self.processing_speed,
            max_size: self.max_size,
            scope: if self.resources_only {
                AssetScope::ResourcesOnly
            } else {
                AssetScope::All
            },
        }
    }

    /// Remember the options of a job
    pub fn update_from(&mut self, config: &JobConfig) {
        self.compression_quality = config.compression_quality;
        self.processing_speed = config.processing_speed;
        self.max_size = config.max_size;
        self.resources_only = config.scope == AssetScope::ResourcesOnly;
    }
}
