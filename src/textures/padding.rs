//! Padding plan for 4-aligned texture sizes
//!
//! Block-compressed formats work on 4x4 blocks, so each side is grown to the
//! next multiple of 4. Growth is planned one pixel at a time: every step is a
//! separate resample, width first, then height.
//!
//! Sides above [`MAX_ALIGNED_SIDE`] have no multiple of 4 in `u32` and cannot
//! be planned.

use super::pixels::{is_divisible_by_4, Dimensions};

/// Largest side length that can be aligned
pub const MAX_ALIGNED_SIDE: u32 = u32::MAX - 3;

/// Smallest multiple of 4 that is >= `n`, found by counting up one unit at a time
fn align_axis(mut n: u32) -> Option<u32> {
    while !is_divisible_by_4(n) {
        n = n.checked_add(1)?;
    }
    Some(n)
}

/// Smallest `(width', height')` with both sides multiples of 4 and not smaller
/// than the input. `None` when a side is larger than [`MAX_ALIGNED_SIDE`].
pub fn compute_aligned_size(width: u32, height: u32) -> Option<(u32, u32)> {
    Some((align_axis(width)?, align_axis(height)?))
}

/// Intermediate sizes to resample through, in order.
///
/// Width grows first with height held, then height grows with the final width.
/// Each entry differs from the previous size by one pixel on one axis. An
/// already aligned size gives an empty plan, an unalignable one gives `None`.
pub fn padding_steps(width: u32, height: u32) -> Option<Vec<Dimensions>> {
    let (aligned_width, aligned_height) = compute_aligned_size(width, height)?;
    let mut steps = Vec::new();
    let mut current = Dimensions::new(width, height);

    while current.width < aligned_width {
        current.width += 1;
        steps.push(current);
    }
    while current.height < aligned_height {
        current.height += 1;
        steps.push(current);
    }

    Some(steps)
}
