//! Floating-point RGBA pixel storage
//!
//! Channels are normalized floats with no range restriction, so unclamped
//! interpolation can leave them outside [0, 1]. Clamping only happens when
//! converting back to 8-bit with [`PixelBuffer::to_rgba8`].

use image::{Rgba, RgbaImage};
use std::fmt;

/// A single RGBA color with float channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Component-wise `a + (b - a) * t` without clamping `t` or the result
    #[inline]
    pub fn lerp_unclamped(a: Color, b: Color, t: f32) -> Color {
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }

    /// Channels as an array, in r, g, b, a order
    pub fn channels(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn from_rgba8(px: &Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Color::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    fn to_rgba8(self) -> Rgba<u8> {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ])
    }
}

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both sides are multiples of 4 (block-compression friendly)
    pub fn is_aligned(&self) -> bool {
        is_divisible_by_4(self.width) && is_divisible_by_4(self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[inline]
pub(crate) fn is_divisible_by_4(n: u32) -> bool {
    n % 4 == 0
}

/// Errors constructing a pixel buffer
#[derive(Debug, thiserror::Error)]
pub enum PixelError {
    #[error("Pixel count {actual} does not match {width}x{height} (expected {expected})")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Row-major RGBA buffer, row 0 first
///
/// Always holds exactly `width * height` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Wrap existing pixels, checking the length invariant
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, PixelError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(PixelError::LengthMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Caller guarantees `pixels.len() == width * height`
    pub(crate) fn from_raw_parts(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Buffer of the given size filled with one color
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Color) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Decode an 8-bit RGBA image into normalized floats
    pub fn from_rgba8(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.pixels().map(Color::from_rgba8).collect(),
        }
    }

    /// Quantize back to 8-bit, clamping channels to [0, 1]
    pub fn to_rgba8(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for (dst, src) in image.pixels_mut().zip(&self.pixels) {
            *dst = src.to_rgba8();
        }
        image
    }
}
