//! Hilbert curve ordering.
//!
//! The Hilbert curve maps 2D coordinates to a 1D index while keeping nearby
//! points close together along the curve. Bulk insertion and rebuilds sort
//! entries by the Hilbert index of their centers, so consecutive inserts land
//! in the same region of the tree.

use crate::bounding_box::BoundingBox;

/// Maximum order for Hilbert curve encoding (determines precision)
const MAX_HILBERT_ORDER: u32 = 32;

/// Encodes 2D coordinates to a Hilbert curve index.
///
/// # Arguments
/// * `x` - X coordinate (normalized to [0, 1])
/// * `y` - Y coordinate (normalized to [0, 1])
/// * `order` - Hilbert curve order (1-32, higher = more precision)
///
/// # Example
/// ```
/// use geo_rtree::hilbert::hilbert_index;
///
/// let index = hilbert_index(0.5, 0.5, 16);
/// assert!(index < (1u64 << 32)); // At order 16, max index is 2^32-1
/// ```
pub fn hilbert_index(x: f64, y: f64, order: u32) -> u64 {
    debug_assert!((0.0..=1.0).contains(&x), "x must be in [0,1]");
    debug_assert!((0.0..=1.0).contains(&y), "y must be in [0,1]");
    debug_assert!(order > 0 && order <= MAX_HILBERT_ORDER, "order must be 1-32");

    // Convert normalized coordinates to discrete grid coordinates
    let n = 1u64 << order;
    let xi = ((x * (n as f64 - 0.5)) as u64).min(n - 1);
    let yi = ((y * (n as f64 - 0.5)) as u64).min(n - 1);

    xy2d(n, xi, yi)
}

/// Encodes a point relative to `extent` to a Hilbert curve index.
///
/// Coordinates are normalized to the extent and clamped. An axis with no
/// finite width, and any coordinate that does not normalize to a finite
/// value, maps to the middle of the curve's range on that axis.
pub fn hilbert_index_bounded(x: f64, y: f64, extent: &BoundingBox, order: u32) -> u64 {
    let x_norm = normalize(x, extent.min_x, extent.max_x);
    let y_norm = normalize(y, extent.min_y, extent.max_y);
    hilbert_index(x_norm, y_norm, order)
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if !(range > 0.0 && range.is_finite()) {
        return 0.5;
    }
    let norm = (value - min) / range;
    if norm.is_finite() {
        norm.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Converts grid coordinates on an `n` x `n` Hilbert curve to a distance.
fn xy2d(n: u64, x: u64, y: u64) -> u64 {
    let mut d = 0u64;
    let mut x = x;
    let mut y = y;
    let mut s = n / 2;

    while s > 0 {
        let rx = ((x & s) > 0) as u64;
        let ry = ((y & s) > 0) as u64;
        d += s * s * ((3 * rx) ^ ry);
        rotate(s, &mut x, &mut y, rx, ry);
        s /= 2;
    }

    d
}

/// Rotates and reflects a quadrant so the curve stays continuous.
fn rotate(n: u64, x: &mut u64, y: &mut u64, rx: u64, ry: u64) {
    if ry == 0 {
        if rx == 1 {
            *x = n.wrapping_sub(1).wrapping_sub(*x);
            *y = n.wrapping_sub(1).wrapping_sub(*y);
        }
        std::mem::swap(x, y);
    }
}
