//! Host asset database abstraction
//!
//! The cruncher never owns textures. It reads and mutates them through a
//! [`TextureHost`], which is responsible for loading, importing and saving.
//!
//! Two hosts ship with the crate:
//! - [`MemoryHost`]: in-memory textures with failure injection
//! - [`FsHost`]: a project directory of image files with JSON import sidecars

mod fs;
mod memory;

pub use fs::FsHost;
pub use memory::{HostOp, MemoryHost, MemoryTexture};

use crate::config::{AssetScope, MaxTextureSize};
use crate::textures::{Dimensions, PixelBuffer};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project-relative asset path, e.g. `Assets/Resources/ui/icon.png`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self(crate::paths::to_linux_path(&path.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetHandle {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// The part of the import settings that decides whether a texture needs work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionState {
    pub quality: u8,
    pub crunched: bool,
}

/// Texture import settings as the host stores them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Block compression enabled
    pub compressed: bool,
    /// Crunch (lossy) compression on top of block compression
    pub crunched: bool,
    /// Crunch quality, 0-100
    pub quality: u8,
    /// Largest dimension the imported texture may have
    pub max_size: MaxTextureSize,
    /// CPU-side pixel copy kept after import
    pub readable: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            compressed: true,
            crunched: false,
            quality: 50,
            max_size: MaxTextureSize::S2048,
            readable: false,
        }
    }
}

impl ImportSettings {
    pub fn compression_state(&self) -> CompressionState {
        CompressionState {
            quality: self.quality,
            crunched: self.crunched,
        }
    }
}

/// Asset database operations the cruncher needs
///
/// All calls are synchronous and made from the thread driving the job.
pub trait TextureHost {
    /// Texture assets inside `scope`, in a stable order
    fn query_textures(&self, scope: AssetScope) -> Result<Vec<AssetHandle>>;

    /// Persisted compression quality and crunch flag; unsaved edits don't count
    fn compression_state(&self, asset: &AssetHandle) -> Result<CompressionState>;

    /// Current pixel dimensions
    fn dimensions(&mut self, asset: &AssetHandle) -> Result<Dimensions>;

    /// Copy of the current pixels
    fn pixels(&mut self, asset: &AssetHandle) -> Result<PixelBuffer>;

    /// Replace the pixels; must match the current dimensions
    fn set_pixels(&mut self, asset: &AssetHandle, pixels: PixelBuffer) -> Result<()>;

    /// Resize the texture storage; pixel contents are undefined until `set_pixels`
    fn set_dimensions(&mut self, asset: &AssetHandle, dimensions: Dimensions) -> Result<()>;

    /// Make the texture readable and uncompressed so its pixels can be rewritten
    fn begin_edit(&mut self, asset: &AssetHandle) -> Result<()>;

    /// Replace the import settings
    fn set_import_settings(&mut self, asset: &AssetHandle, settings: ImportSettings) -> Result<()>;

    /// Save pixels and settings and reimport.
    /// Unsaved edits are dropped whether or not the save succeeds.
    fn persist(&mut self, asset: &AssetHandle) -> Result<()>;

    /// Drop unsaved edits, going back to the persisted state
    fn discard(&mut self, asset: &AssetHandle) -> Result<()>;
}
