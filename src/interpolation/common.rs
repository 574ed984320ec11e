//! Common utilities for interpolation algorithms.

/// Map a coordinate value to a fractional index into a monotonic axis.
///
/// Works for increasing and decreasing axes. Returns `None` when the value
/// lies outside the axis.
pub fn coord_to_index(coord: f64, axis: &[f64]) -> Option<f64> {
    let n = axis.len();
    if n == 0 || !coord.is_finite() {
        return None;
    }
    if n == 1 {
        return (coord == axis[0]).then_some(0.0);
    }

    let ascending = axis[n - 1] >= axis[0];
    let (lo, hi) = if ascending {
        (axis[0], axis[n - 1])
    } else {
        (axis[n - 1], axis[0])
    };
    if coord < lo || coord > hi {
        return None;
    }

    // First index whose value is past `coord` in axis order
    let upper = if ascending {
        axis.partition_point(|&v| v <= coord)
    } else {
        axis.partition_point(|&v| v >= coord)
    };

    if upper == 0 {
        return Some(0.0);
    }
    if upper >= n {
        return Some((n - 1) as f64);
    }

    let (i0, v0, v1) = (upper - 1, axis[upper - 1], axis[upper]);
    let fraction = if v1 != v0 { (coord - v0) / (v1 - v0) } else { 0.0 };
    Some(i0 as f64 + fraction)
}

/// Clamp an index to valid bounds
pub fn clamp_index(index: f64, size: usize) -> f64 {
    index.max(0.0).min((size - 1) as f64)
}

/// Get the weight for linear interpolation
pub fn linear_weight(fraction: f64) -> (f64, f64) {
    (1.0 - fraction, fraction)
}
