//! Bilinear resampling
//!
//! Maps a source buffer onto an arbitrary destination size. Each destination
//! pixel samples its four nearest source neighbours and blends them with
//! unclamped linear interpolation, horizontally first, then vertically.

use super::pixels::{Color, PixelBuffer};
use tracing::trace;

/// Precomputed sampling for one destination coordinate on one axis
#[derive(Debug, Clone, Copy)]
struct AxisSample {
    /// Source index of the lower neighbour
    lo: usize,
    /// Source index of the upper neighbour (clamped to the last index)
    hi: usize,
    /// Weight of `hi`
    t: f32,
}

/// Inverse scale factor for one axis
///
/// An axis that keeps its size maps 1:1, so an intermediate padding step
/// leaves the untouched axis bit-exact.
fn axis_ratio(src_len: u32, dst_len: u32) -> f32 {
    if src_len == dst_len {
        1.0
    } else {
        // src_len == 1 gives 0: every destination pixel samples index 0
        src_len.saturating_sub(1) as f32 / dst_len as f32
    }
}

/// Sampling table for every destination index along one axis.
/// Requires `src_len >= 1` and `dst_len >= 1`.
fn axis_samples(src_len: u32, dst_len: u32) -> Vec<AxisSample> {
    let ratio = axis_ratio(src_len, dst_len);
    let last = src_len as usize - 1;

    (0..dst_len)
        .map(|i| {
            let pos = i as f32 * ratio;
            let floor = pos.floor();
            let lo = (floor as usize).min(last);
            AxisSample {
                lo,
                hi: (lo + 1).min(last),
                t: pos - floor,
            }
        })
        .collect()
}

/// Resample `source` to `new_width` x `new_height` with bilinear filtering.
///
/// The source is only read; a fresh buffer is returned. Degenerate sizes never
/// fail: a zero-sized target yields an empty buffer, and an empty source yields
/// a transparent buffer of the requested size.
///
/// With `ratio = (src - 1) / new` every sample position stays inside the
/// source, so interpolation weights are in `[0, 1)` and interior output is
/// bounded by its neighbours. Interpolation is still unclamped, so channels
/// already outside `[0, 1]` in the source pass through unchanged in kind.
pub fn scale(source: &PixelBuffer, new_width: u32, new_height: u32) -> PixelBuffer {
    if new_width == 0 || new_height == 0 || source.is_empty() {
        trace!(
            "Degenerate resample {} -> {}x{}",
            source.dimensions(),
            new_width,
            new_height
        );
        return PixelBuffer::filled(new_width, new_height, Color::TRANSPARENT);
    }

    let src = source.pixels();
    let src_w = source.width() as usize;
    let columns = axis_samples(source.width(), new_width);
    let rows = axis_samples(source.height(), new_height);

    let mut out = Vec::with_capacity(new_width as usize * new_height as usize);
    for row in &rows {
        let top = row.lo * src_w;
        let bottom = row.hi * src_w;

        for col in &columns {
            let upper = Color::lerp_unclamped(src[top + col.lo], src[top + col.hi], col.t);
            let lower = Color::lerp_unclamped(src[bottom + col.lo], src[bottom + col.hi], col.t);
            out.push(Color::lerp_unclamped(upper, lower, row.t));
        }
    }

    PixelBuffer::from_raw_parts(new_width, new_height, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            Color::new(
                x as f32 / width.max(1) as f32,
                y as f32 / height.max(1) as f32,
                ((x * 7 + y * 13) % 11) as f32 / 10.0,
                1.0,
            )
        })
    }

    fn assert_all_finite(buffer: &PixelBuffer) {
        for c in buffer.pixels() {
            assert!(c.channels().iter().all(|v| v.is_finite()), "non-finite {:?}", c);
        }
    }

    #[test]
    fn test_same_size_is_identity() {
        for (w, h) in [(1, 1), (3, 5), (10, 7), (16, 16)] {
            let src = gradient(w, h);
            let out = scale(&src, w, h);
            assert_eq!(out.dimensions(), src.dimensions());
            for (a, b) in out.pixels().iter().zip(src.pixels()) {
                for (ca, cb) in a.channels().iter().zip(b.channels()) {
                    assert!((ca - cb).abs() <= EPS);
                }
            }
        }
    }

    #[test]
    fn test_output_has_requested_size() {
        let src = gradient(10, 7);
        let out = scale(&src, 23, 4);
        assert_eq!(out.width(), 23);
        assert_eq!(out.height(), 4);
        assert_eq!(out.pixels().len(), 23 * 4);
    }

    #[test]
    fn test_interior_samples_stay_within_neighbours() {
        let src = gradient(9, 6);
        let (new_w, new_h) = (17u32, 11u32);
        let out = scale(&src, new_w, new_h);

        let columns = axis_samples(9, new_w);
        let rows = axis_samples(6, new_h);

        for (y, row) in rows.iter().enumerate() {
            assert!((0.0..1.0).contains(&row.t));
            for (x, col) in columns.iter().enumerate() {
                assert!((0.0..1.0).contains(&col.t));

                let neighbours = [
                    src.get(col.lo as u32, row.lo as u32).unwrap(),
                    src.get(col.hi as u32, row.lo as u32).unwrap(),
                    src.get(col.lo as u32, row.hi as u32).unwrap(),
                    src.get(col.hi as u32, row.hi as u32).unwrap(),
                ];
                let value = out.get(x as u32, y as u32).unwrap().channels();
                for ch in 0..4 {
                    let lo = neighbours.iter().map(|c| c.channels()[ch]).fold(f32::MAX, f32::min);
                    let hi = neighbours.iter().map(|c| c.channels()[ch]).fold(f32::MIN, f32::max);
                    assert!(value[ch] >= lo - EPS && value[ch] <= hi + EPS);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_input_is_not_clamped() {
        let src = PixelBuffer::from_pixels(
            2,
            1,
            vec![Color::new(-1.0, 0.0, 0.0, 1.0), Color::new(3.0, 0.0, 0.0, 1.0)],
        )
        .unwrap();

        let out = scale(&src, 4, 1);
        // ratio = 1/4: x = 0.25, 0.5, 0.75 blend between -1 and 3
        assert!((out.get(0, 0).unwrap().r + 1.0).abs() <= EPS);
        assert!((out.get(1, 0).unwrap().r - 0.0).abs() <= EPS);
        assert!((out.get(3, 0).unwrap().r - 2.0).abs() <= EPS);
    }

    #[test]
    fn test_single_column_source_has_no_nan() {
        // (width - 1) == 0 makes the horizontal ratio zero
        let src = gradient(1, 5);
        let out = scale(&src, 4, 5);
        assert_all_finite(&out);
        for y in 0..5 {
            for x in 0..4 {
                assert_eq!(out.get(x, y), src.get(0, y));
            }
        }
    }

    #[test]
    fn test_single_row_source_has_no_nan() {
        let src = gradient(6, 1);
        let out = scale(&src, 6, 4);
        assert_all_finite(&out);
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(out.get(x, y), src.get(x, 0));
            }
        }
    }

    #[test]
    fn test_single_pixel_target_and_source() {
        let src = gradient(5, 5);
        let out = scale(&src, 1, 1);
        assert_eq!(out.get(0, 0), src.get(0, 0));

        let one = PixelBuffer::filled(1, 1, Color::new(0.2, 0.4, 0.6, 0.8));
        let grown = scale(&one, 4, 4);
        assert_all_finite(&grown);
        assert!(grown.pixels().iter().all(|c| *c == Color::new(0.2, 0.4, 0.6, 0.8)));
    }

    #[test]
    fn test_zero_sized_inputs() {
        let src = gradient(4, 4);
        let out = scale(&src, 0, 4);
        assert!(out.is_empty());
        assert_eq!(out.height(), 4);

        let empty = PixelBuffer::filled(0, 0, Color::TRANSPARENT);
        let out = scale(&empty, 3, 2);
        assert_eq!(out.pixels().len(), 6);
        assert!(out.pixels().iter().all(|c| *c == Color::TRANSPARENT));
    }

    #[test]
    fn test_unchanged_axis_is_preserved() {
        let src = gradient(10, 7);

        // width step: every row keeps its exact source values
        let wider = scale(&src, 11, 7);
        for y in 0..7 {
            assert_eq!(wider.get(0, y), src.get(0, y));
            for x in 0..11 {
                assert_eq!(wider.get(x, y).unwrap().g, src.get(0, y).unwrap().g);
            }
        }

        // height step: every column keeps its exact source values
        let taller = scale(&src, 10, 8);
        for x in 0..10 {
            assert_eq!(taller.get(x, 0), src.get(x, 0));
            for y in 0..8 {
                assert_eq!(taller.get(x, y).unwrap().r, src.get(x, 0).unwrap().r);
            }
        }
    }
}
