//! In-memory texture host
//!
//! Keeps textures in a sorted map and can be told to fail specific
//! operations on specific assets. Used by the test suite and by embedders
//! that already hold decoded textures.

use super::{AssetHandle, CompressionState, ImportSettings, TextureHost};
use crate::config::AssetScope;
use crate::paths;
use crate::textures::{Color, Dimensions, PixelBuffer};
use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Host operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    CompressionState,
    BeginEdit,
    Read,
    Write,
    Persist,
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostOp::CompressionState => "compression state",
            HostOp::BeginEdit => "begin edit",
            HostOp::Read => "read",
            HostOp::Write => "write",
            HostOp::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Persisted state of one texture held by [`MemoryHost`]
#[derive(Debug, Clone)]
pub struct MemoryTexture {
    pub pixels: PixelBuffer,
    pub settings: ImportSettings,
    /// Number of successful `persist` calls
    pub persist_count: usize,
}

/// Edits made since the last persist
#[derive(Debug, Clone)]
struct Staged {
    pixels: PixelBuffer,
    settings: ImportSettings,
}

/// Texture host backed by memory
#[derive(Debug, Default)]
pub struct MemoryHost {
    textures: BTreeMap<AssetHandle, MemoryTexture>,
    staged: HashMap<AssetHandle, Staged>,
    failures: HashSet<(AssetHandle, HostOp)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a texture
    pub fn insert(
        &mut self,
        path: &str,
        pixels: PixelBuffer,
        settings: ImportSettings,
    ) -> AssetHandle {
        let handle = AssetHandle::new(path);
        self.staged.remove(&handle);
        self.textures.insert(
            handle.clone(),
            MemoryTexture {
                pixels,
                settings,
                persist_count: 0,
            },
        );
        handle
    }

    /// Add a texture of the given size filled with one color
    pub fn insert_filled(
        &mut self,
        path: &str,
        width: u32,
        height: u32,
        settings: ImportSettings,
    ) -> AssetHandle {
        let pixels = PixelBuffer::filled(width, height, Color::new(1.0, 1.0, 1.0, 1.0));
        self.insert(path, pixels, settings)
    }

    /// Make `op` fail for `asset` from now on
    pub fn fail_on(&mut self, asset: &AssetHandle, op: HostOp) {
        self.failures.insert((asset.clone(), op));
    }

    /// Persisted state of a texture
    pub fn texture(&self, asset: &AssetHandle) -> Option<&MemoryTexture> {
        self.textures.get(asset)
    }

    fn check(&self, asset: &AssetHandle, op: HostOp) -> Result<()> {
        if self.failures.contains(&(asset.clone(), op)) {
            bail!("Injected {} failure for {}", op, asset);
        }
        Ok(())
    }

    fn persisted(&self, asset: &AssetHandle, op: HostOp) -> Result<&MemoryTexture> {
        self.check(asset, op)?;
        match self.textures.get(asset) {
            Some(texture) => Ok(texture),
            None => bail!("Asset not found: {}", asset),
        }
    }

    /// Pixels including unsaved edits
    fn current_pixels(&self, asset: &AssetHandle) -> Result<&PixelBuffer> {
        let texture = self.persisted(asset, HostOp::Read)?;
        Ok(match self.staged.get(asset) {
            Some(staged) => &staged.pixels,
            None => &texture.pixels,
        })
    }

    /// Edit state for an asset, starting from its persisted state
    fn staged_mut(&mut self, asset: &AssetHandle, op: HostOp) -> Result<&mut Staged> {
        self.check(asset, op)?;
        let Some(texture) = self.textures.get(asset) else {
            bail!("Asset not found: {}", asset);
        };
        Ok(self.staged.entry(asset.clone()).or_insert_with(|| Staged {
            pixels: texture.pixels.clone(),
            settings: texture.settings,
        }))
    }
}

impl TextureHost for MemoryHost {
    fn query_textures(&self, scope: AssetScope) -> Result<Vec<AssetHandle>> {
        let folder = match scope {
            AssetScope::All => paths::ASSETS_DIR,
            AssetScope::ResourcesOnly => paths::RESOURCES_DIR,
        };
        Ok(self
            .textures
            .keys()
            .filter(|handle| paths::is_within(handle.as_str(), folder))
            .cloned()
            .collect())
    }

    fn compression_state(&self, asset: &AssetHandle) -> Result<CompressionState> {
        Ok(self
            .persisted(asset, HostOp::CompressionState)?
            .settings
            .compression_state())
    }

    fn dimensions(&mut self, asset: &AssetHandle) -> Result<Dimensions> {
        Ok(self.current_pixels(asset)?.dimensions())
    }

    fn pixels(&mut self, asset: &AssetHandle) -> Result<PixelBuffer> {
        Ok(self.current_pixels(asset)?.clone())
    }

    fn set_pixels(&mut self, asset: &AssetHandle, pixels: PixelBuffer) -> Result<()> {
        let staged = self.staged_mut(asset, HostOp::Write)?;
        if pixels.dimensions() != staged.pixels.dimensions() {
            bail!(
                "Pixel buffer {} does not match texture size {} for {}",
                pixels.dimensions(),
                staged.pixels.dimensions(),
                asset
            );
        }
        staged.pixels = pixels;
        Ok(())
    }

    fn set_dimensions(&mut self, asset: &AssetHandle, dimensions: Dimensions) -> Result<()> {
        let staged = self.staged_mut(asset, HostOp::Write)?;
        staged.pixels = PixelBuffer::filled(dimensions.width, dimensions.height, Color::TRANSPARENT);
        Ok(())
    }

    fn begin_edit(&mut self, asset: &AssetHandle) -> Result<()> {
        let staged = self.staged_mut(asset, HostOp::BeginEdit)?;
        staged.settings.readable = true;
        staged.settings.compressed = false;
        Ok(())
    }

    fn set_import_settings(&mut self, asset: &AssetHandle, settings: ImportSettings) -> Result<()> {
        self.staged_mut(asset, HostOp::Write)?.settings = settings;
        Ok(())
    }

    fn persist(&mut self, asset: &AssetHandle) -> Result<()> {
        let staged = self.staged.remove(asset);
        self.check(asset, HostOp::Persist)?;
        let Some(texture) = self.textures.get_mut(asset) else {
            bail!("Asset not found: {}", asset);
        };

        if let Some(staged) = staged {
            texture.pixels = staged.pixels;
            texture.settings = staged.settings;
        }
        texture.persist_count += 1;
        Ok(())
    }

    fn discard(&mut self, asset: &AssetHandle) -> Result<()> {
        self.staged.remove(asset);
        Ok(())
    }
}
