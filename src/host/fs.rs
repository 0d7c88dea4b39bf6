//! Filesystem texture host
//!
//! Treats `<project>/Assets` as the asset database. Textures are PNG, TGA or
//! JPEG files; import settings live next to each file in a JSON sidecar
//! (`wall.png` -> `wall.png.import.json`). A missing sidecar means default
//! import settings.
//!
//! Pixel edits and settings changes are held in memory until `persist`.

use super::{AssetHandle, CompressionState, ImportSettings, TextureHost};
use crate::config::AssetScope;
use crate::paths;
use crate::textures::{Color, Dimensions, PixelBuffer};
use anyhow::{bail, Context, Result};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

/// Decoded pixels waiting to be saved
#[derive(Debug)]
struct LoadedTexture {
    pixels: PixelBuffer,
    dirty: bool,
}

/// Texture host over a project directory
#[derive(Debug)]
pub struct FsHost {
    root: PathBuf,
    loaded: HashMap<AssetHandle, LoadedTexture>,
    pending_settings: HashMap<AssetHandle, ImportSettings>,
}

impl FsHost {
    /// Open a project directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("Project directory not found: {}", root.display());
        }
        Ok(Self {
            root,
            loaded: HashMap::new(),
            pending_settings: HashMap::new(),
        })
    }

    /// Absolute path of an asset
    pub fn asset_path(&self, asset: &AssetHandle) -> PathBuf {
        self.root.join(asset.as_str())
    }

    /// Current import settings, including unsaved changes
    pub fn import_settings(&self, asset: &AssetHandle) -> Result<ImportSettings> {
        match self.pending_settings.get(asset) {
            Some(settings) => Ok(*settings),
            None => self.saved_import_settings(asset),
        }
    }

    /// Import settings as stored in the sidecar
    pub fn saved_import_settings(&self, asset: &AssetHandle) -> Result<ImportSettings> {
        let sidecar = paths::sidecar_path(&self.asset_path(asset));
        if !sidecar.exists() {
            return Ok(ImportSettings::default());
        }

        let content = std::fs::read_to_string(&sidecar)
            .with_context(|| format!("Failed to read {}", sidecar.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", sidecar.display()))
    }

    fn require_file(&self, asset: &AssetHandle) -> Result<PathBuf> {
        let path = self.asset_path(asset);
        if !path.is_file() {
            bail!("Texture not found: {}", path.display());
        }
        Ok(path)
    }

    fn load(&mut self, asset: &AssetHandle) -> Result<&mut LoadedTexture> {
        if !self.loaded.contains_key(asset) {
            let path = self.require_file(asset)?;
            let image = image::open(&path)
                .with_context(|| format!("Failed to decode {}", path.display()))?;
            debug!("Loaded {} ({}x{})", asset, image.width(), image.height());

            self.loaded.insert(
                asset.clone(),
                LoadedTexture {
                    pixels: PixelBuffer::from_rgba8(&image.to_rgba8()),
                    dirty: false,
                },
            );
        }

        self.loaded
            .get_mut(asset)
            .with_context(|| format!("Texture cache lost {}", asset))
    }

    fn save_pixels(&self, asset: &AssetHandle, pixels: &PixelBuffer) -> Result<()> {
        let path = self.asset_path(asset);
        paths::ensure_parent_dirs(&path)?;

        let image = pixels.to_rgba8();
        // JPEG has no alpha channel
        let result = if paths::is_jpeg_path(asset.as_str()) {
            DynamicImage::ImageRgba8(image).to_rgb8().save(&path)
        } else {
            image.save(&path)
        };
        result.with_context(|| format!("Failed to write {}", path.display()))
    }

    fn save_settings(&self, asset: &AssetHandle, settings: &ImportSettings) -> Result<()> {
        let sidecar = paths::sidecar_path(&self.asset_path(asset));
        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize import settings")?;
        std::fs::write(&sidecar, content)
            .with_context(|| format!("Failed to write {}", sidecar.display()))
    }
}

impl TextureHost for FsHost {
    fn query_textures(&self, scope: AssetScope) -> Result<Vec<AssetHandle>> {
        let folder = match scope {
            AssetScope::All => paths::ASSETS_DIR,
            AssetScope::ResourcesOnly => paths::RESOURCES_DIR,
        };

        let Some(base) = paths::resolve_case_insensitive(&self.root, folder) else {
            debug!("No {} folder in {}", folder, self.root.display());
            return Ok(Vec::new());
        };

        let mut handles = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = entry.with_context(|| format!("Failed to scan {}", base.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = paths::relative_asset_path(&self.root, entry.path()) else {
                continue;
            };
            if paths::is_texture_path(&relative) {
                handles.push(AssetHandle::new(relative));
            }
        }

        handles.sort();
        Ok(handles)
    }

    fn compression_state(&self, asset: &AssetHandle) -> Result<CompressionState> {
        Ok(self.saved_import_settings(asset)?.compression_state())
    }

    fn dimensions(&mut self, asset: &AssetHandle) -> Result<Dimensions> {
        if let Some(texture) = self.loaded.get(asset) {
            return Ok(texture.pixels.dimensions());
        }

        let path = self.require_file(asset)?;
        let (width, height) = image::image_dimensions(&path)
            .with_context(|| format!("Failed to read size of {}", path.display()))?;
        Ok(Dimensions::new(width, height))
    }

    fn pixels(&mut self, asset: &AssetHandle) -> Result<PixelBuffer> {
        Ok(self.load(asset)?.pixels.clone())
    }

    fn set_pixels(&mut self, asset: &AssetHandle, pixels: PixelBuffer) -> Result<()> {
        let texture = self.load(asset)?;
        if pixels.dimensions() != texture.pixels.dimensions() {
            bail!(
                "Pixel buffer {} does not match texture size {} for {}",
                pixels.dimensions(),
                texture.pixels.dimensions(),
                asset
            );
        }
        texture.pixels = pixels;
        texture.dirty = true;
        Ok(())
    }

    fn set_dimensions(&mut self, asset: &AssetHandle, dimensions: Dimensions) -> Result<()> {
        self.require_file(asset)?;
        self.loaded.insert(
            asset.clone(),
            LoadedTexture {
                pixels: PixelBuffer::filled(dimensions.width, dimensions.height, Color::TRANSPARENT),
                dirty: true,
            },
        );
        Ok(())
    }

    fn begin_edit(&mut self, asset: &AssetHandle) -> Result<()> {
        self.require_file(asset)?;
        let mut settings = self.import_settings(asset)?;
        settings.readable = true;
        settings.compressed = false;
        self.pending_settings.insert(asset.clone(), settings);
        Ok(())
    }

    fn set_import_settings(&mut self, asset: &AssetHandle, settings: ImportSettings) -> Result<()> {
        self.require_file(asset)?;
        self.pending_settings.insert(asset.clone(), settings);
        Ok(())
    }

    fn persist(&mut self, asset: &AssetHandle) -> Result<()> {
        // Taken up front so a failed save leaves nothing stale behind
        let texture = self.loaded.remove(asset);
        let settings = self.pending_settings.remove(asset);

        if let Some(texture) = texture.filter(|t| t.dirty) {
            self.save_pixels(asset, &texture.pixels)?;
            debug!("Saved {} ({})", asset, texture.pixels.dimensions());
        }

        if let Some(settings) = settings {
            self.save_settings(asset, &settings)?;
        }

        Ok(())
    }

    fn discard(&mut self, asset: &AssetHandle) -> Result<()> {
        self.loaded.remove(asset);
        self.pending_settings.remove(asset);
        Ok(())
    }
}
