//! Texture pixel processing
//!
//! Pure Rust resampling and padding for block-compression friendly sizes,
//! plus the per-texture crunch pipeline that drives a [`crate::host::TextureHost`].

mod padding;
mod pixels;
mod processor;
mod resample;

pub use padding::{compute_aligned_size, padding_steps, MAX_ALIGNED_SIDE};
pub use pixels::{Color, Dimensions, PixelBuffer, PixelError};
pub use processor::{crunch_texture, pad_to_alignment, CrunchOutcome};
pub use resample::scale;
