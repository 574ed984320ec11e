//! Grid sampling for rendering.
//!
//! Interpolators read a value from a 2D grid at fractional `(row, col)`
//! indices, as produced by mapping pixel centres back onto the data grid.

pub mod bilinear;
pub mod common;
pub mod nearest;

use ndarray::ArrayView2;

use crate::error::{GenMapError, Result};

/// Trait for interpolation methods
pub trait Interpolator {
    /// Interpolate a value at the given fractional indices
    fn interpolate(&self, data: &ArrayView2<f32>, row: f64, col: f64) -> f32;

    /// Get the name of this interpolation method
    fn name(&self) -> &str;
}

/// Names accepted by [`get_interpolator`]
pub const INTERPOLATION_METHODS: &[&str] = &["nearest", "bilinear"];

/// Get an interpolator by name
pub fn get_interpolator(name: &str) -> Result<Box<dyn Interpolator>> {
    match name.to_lowercase().as_str() {
        "nearest" => Ok(Box::new(nearest::NearestInterpolator)),
        "bilinear" => Ok(Box::new(bilinear::BilinearInterpolator)),
        _ => Err(GenMapError::invalid(
            "resampling",
            format!(
                "Unknown interpolation method: {}. Must be one of: {}",
                name,
                INTERPOLATION_METHODS.join(", ")
            ),
        )),
    }
}
