//! Regular lat/lon grids handed to the map renderer.

use ndarray::Array2;
use serde::Deserialize;
use std::path::Path;

use crate::error::{GenMapError, Result};
use crate::interpolation::common::coord_to_index;

/// Scalar field on a regular grid. Rows follow `lat`, columns follow `lon`.
#[derive(Debug, Clone)]
pub struct Grid {
    lat: Vec<f64>,
    lon: Vec<f64>,
    values: Array2<f32>,
}

impl Grid {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>, values: Array2<f32>) -> Result<Self> {
        check_axis("lat", &lat)?;
        check_axis("lon", &lon)?;
        if values.dim() != (lat.len(), lon.len()) {
            return Err(GenMapError::invalid(
                "values",
                format!(
                    "data shape {:?} does not match lat ({}) x lon ({})",
                    values.dim(),
                    lat.len(),
                    lon.len()
                ),
            ));
        }
        Ok(Self { lat, lon, values })
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Fractional `(row, col)` of a geographic point, if it lies on the grid
    pub fn locate(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        Some((coord_to_index(lat, &self.lat)?, coord_to_index(lon, &self.lon)?))
    }
}

/// Vector field (`u` eastward, `v` northward) on a regular grid
#[derive(Debug, Clone)]
pub struct VectorGrid {
    lat: Vec<f64>,
    lon: Vec<f64>,
    u: Array2<f32>,
    v: Array2<f32>,
}

impl VectorGrid {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>, u: Array2<f32>, v: Array2<f32>) -> Result<Self> {
        check_axis("lat", &lat)?;
        check_axis("lon", &lon)?;
        let expected = (lat.len(), lon.len());
        if u.dim() != expected || v.dim() != expected {
            return Err(GenMapError::invalid(
                "u/v",
                format!(
                    "vector components {:?} and {:?} must both be {:?}",
                    u.dim(),
                    v.dim(),
                    expected
                ),
            ));
        }
        Ok(Self { lat, lon, u, v })
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn u(&self) -> &Array2<f32> {
        &self.u
    }

    pub fn v(&self) -> &Array2<f32> {
        &self.v
    }

    pub fn locate(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        Some((coord_to_index(lat, &self.lat)?, coord_to_index(lon, &self.lon)?))
    }

    /// Vector magnitude as a scalar grid
    pub fn speed(&self) -> Grid {
        let values = ndarray::Zip::from(&self.u)
            .and(&self.v)
            .map_collect(|&u, &v| u.hypot(v));
        Grid {
            lat: self.lat.clone(),
            lon: self.lon.clone(),
            values,
        }
    }
}

fn check_axis(name: &str, axis: &[f64]) -> Result<()> {
    if axis.is_empty() {
        return Err(GenMapError::invalid(name, "coordinate axis is empty"));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(GenMapError::invalid(name, "coordinates must be finite"));
    }
    let ascending = axis.windows(2).all(|w| w[1] > w[0]);
    let descending = axis.windows(2).all(|w| w[1] < w[0]);
    if !ascending && !descending {
        return Err(GenMapError::invalid(
            name,
            "coordinates must be strictly increasing or decreasing",
        ));
    }
    Ok(())
}

/// On-disk JSON grid: `null` entries are missing values
#[derive(Debug, Deserialize)]
pub struct GridFile {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    #[serde(default)]
    pub values: Option<Vec<Vec<Option<f32>>>>,
    #[serde(default)]
    pub u: Option<Vec<Vec<Option<f32>>>>,
    #[serde(default)]
    pub v: Option<Vec<Vec<Option<f32>>>>,
}

impl GridFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// The scalar field; falls back to vector speed when only `u`/`v` are given
    pub fn scalar(&self) -> Result<Grid> {
        match &self.values {
            Some(rows) => Grid::new(self.lat.clone(), self.lon.clone(), to_array("values", rows)?),
            None => self
                .vectors()?
                .map(|vectors| vectors.speed())
                .ok_or_else(|| GenMapError::invalid("values", "grid file has no values or u/v")),
        }
    }

    pub fn vectors(&self) -> Result<Option<VectorGrid>> {
        match (&self.u, &self.v) {
            (Some(u), Some(v)) => Ok(Some(VectorGrid::new(
                self.lat.clone(),
                self.lon.clone(),
                to_array("u", u)?,
                to_array("v", v)?,
            )?)),
            (None, None) => Ok(None),
            _ => Err(GenMapError::invalid("u/v", "both u and v must be given")),
        }
    }
}

fn to_array(name: &str, rows: &[Vec<Option<f32>>]) -> Result<Array2<f32>> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != width) {
        return Err(GenMapError::invalid(name, "rows have different lengths"));
    }

    let flat: Vec<f32> = rows
        .iter()
        .flatten()
        .map(|v| v.unwrap_or(f32::NAN))
        .collect();
    Array2::from_shape_vec((height, width), flat)
        .map_err(|e| GenMapError::invalid(name, e.to_string()))
}
