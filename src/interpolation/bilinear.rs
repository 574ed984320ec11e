//! Bilinear interpolation.
//!
//! This method performs linear interpolation in two dimensions using
//! the four nearest grid points. A missing value among them makes the
//! result missing.

use ndarray::ArrayView2;

use super::common::{clamp_index, linear_weight};
use super::Interpolator;

/// Bilinear interpolator
pub struct BilinearInterpolator;

impl Interpolator for BilinearInterpolator {
    fn interpolate(&self, data: &ArrayView2<f32>, row: f64, col: f64) -> f32 {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return f32::NAN;
        }

        let row = clamp_index(row, rows);
        let col = clamp_index(col, cols);

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(rows - 1);
        let c1 = (c0 + 1).min(cols - 1);

        let (wr0, wr1) = linear_weight(row - r0 as f64);
        let (wc0, wc1) = linear_weight(col - c0 as f64);

        let top = data[[r0, c0]] as f64 * wc0 + data[[r0, c1]] as f64 * wc1;
        let bottom = data[[r1, c0]] as f64 * wc0 + data[[r1, c1]] as f64 * wc1;
        (top * wr0 + bottom * wr1) as f32
    }

    fn name(&self) -> &str {
        "bilinear"
    }
}
