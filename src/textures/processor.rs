//! Per-texture crunch pipeline
//!
//! One texture is one atomic unit of work for the batch job:
//! 1. Edit     : make readable and uncompressed so pixels can be rewritten
//! 2. Pad      : grow misaligned sides to multiples of 4, one pixel per resample
//! 3. Write    : install the resized pixels back into the asset
//! 4. Compress : crunch quality, max size, readable off
//! 5. Persist  : save and reimport

use super::padding::{padding_steps, MAX_ALIGNED_SIDE};
use super::pixels::{Dimensions, PixelBuffer};
use super::resample::scale;
use crate::config::JobConfig;
use crate::host::{AssetHandle, TextureHost};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// What happened to one texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrunchOutcome {
    /// Size before processing
    pub original: Dimensions,
    /// New size, if the texture had to be padded
    pub padded: Option<Dimensions>,
    /// Number of resample passes performed
    pub resample_steps: usize,
}

/// Grow a buffer to 4-aligned dimensions.
///
/// Resamples once per planned step, each pass working from the previous
/// result. Returns the final buffer and the number of passes; an aligned
/// buffer comes back untouched with zero passes. Fails when a side is too
/// large to align.
pub fn pad_to_alignment(buffer: PixelBuffer) -> Result<(PixelBuffer, usize)> {
    let source = buffer.dimensions();
    let steps = padding_steps(source.width, source.height)
        .with_context(|| format!("Cannot align {}: side exceeds {}", source, MAX_ALIGNED_SIDE))?;
    let count = steps.len();

    let padded = steps.into_iter().fold(buffer, |current, step| {
        debug!("Resample {} -> {}", current.dimensions(), step);
        scale(&current, step.width, step.height)
    });

    Ok((padded, count))
}

/// Run the full crunch pipeline on one asset.
///
/// On failure the host is told to discard the unsaved edits, so the asset
/// keeps its persisted state and stays eligible for the next job.
pub fn crunch_texture<H>(host: &mut H, asset: &AssetHandle, config: &JobConfig) -> Result<CrunchOutcome>
where
    H: TextureHost + ?Sized,
{
    let result = run_pipeline(host, asset, config);

    if result.is_err() {
        if let Err(e) = host.discard(asset) {
            warn!("Failed to discard edits of {}: {:#}", asset, e);
        }
    }

    result
}

fn run_pipeline<H>(host: &mut H, asset: &AssetHandle, config: &JobConfig) -> Result<CrunchOutcome>
where
    H: TextureHost + ?Sized,
{
    host.begin_edit(asset)
        .with_context(|| format!("Failed to prepare {} for editing", asset))?;

    let original = host
        .dimensions(asset)
        .with_context(|| format!("Failed to read size of {}", asset))?;

    let mut outcome = CrunchOutcome {
        original,
        padded: None,
        resample_steps: 0,
    };

    if !original.is_aligned() {
        let pixels = host
            .pixels(asset)
            .with_context(|| format!("Failed to read pixels of {}", asset))?;

        let (padded, steps) = pad_to_alignment(pixels)?;
        let size = padded.dimensions();
        debug!("Padded {} from {} to {} in {} steps", asset, original, size, steps);

        host.set_dimensions(asset, size)
            .with_context(|| format!("Failed to resize {}", asset))?;
        host.set_pixels(asset, padded)
            .with_context(|| format!("Failed to write pixels of {}", asset))?;

        outcome.padded = Some(size);
        outcome.resample_steps = steps;
    }

    host.set_import_settings(asset, config.target_import_settings())
        .with_context(|| format!("Failed to apply import settings to {}", asset))?;

    host.persist(asset)
        .with_context(|| format!("Failed to save {}", asset))?;

    Ok(outcome)
}
