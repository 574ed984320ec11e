//! Nearest neighbor interpolation.
//!
//! This method selects the value of the nearest grid point. It keeps cell
//! boundaries sharp, which suits categorical or coarse data.

use ndarray::ArrayView2;

use super::common::clamp_index;
use super::Interpolator;

/// Nearest neighbor interpolator
pub struct NearestInterpolator;

impl Interpolator for NearestInterpolator {
    fn interpolate(&self, data: &ArrayView2<f32>, row: f64, col: f64) -> f32 {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return f32::NAN;
        }

        let r = clamp_index(row.round(), rows) as usize;
        let c = clamp_index(col.round(), cols) as usize;
        data[[r, c]]
    }

    fn name(&self) -> &str {
        "nearest"
    }
}
