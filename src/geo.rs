//! Geographic utilities: map extents, tick placement and distances.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{GenMapError, Result};

/// Mean Earth radius in kilometres (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Geographic bounds of a map, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Extent {
    /// Create a validated extent
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        let extent = Self {
            north,
            south,
            east,
            west,
        };
        extent.validate()?;
        Ok(extent)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.north, self.south, self.east, self.west];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GenMapError::invalid("extent", "bounds must be finite"));
        }

        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(GenMapError::invalid(
                "extent",
                "Latitude must be in the range -90 to 90",
            ));
        }

        if self.south >= self.north {
            return Err(GenMapError::invalid(
                "extent",
                format!("south ({}) must be < north ({})", self.south, self.north),
            ));
        }

        if self.west >= self.east {
            return Err(GenMapError::invalid(
                "extent",
                format!("west ({}) must be < east ({})", self.west, self.east),
            ));
        }

        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn mid_latitude(&self) -> f64 {
        (self.north + self.south) / 2.0
    }

    /// Point at a fraction of the extent, `(0, 0)` being the south-west corner
    pub fn at_fraction(&self, x_frac: f64, y_frac: f64) -> (f64, f64) {
        (
            self.west + x_frac * self.width(),
            self.south + y_frac * self.height(),
        )
    }
}

impl FromStr for Extent {
    type Err = GenMapError;

    /// Parse `"west,south,east,north"`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GenMapError::invalid(
                "bbox",
                "Bounding box must be in format 'west,south,east,north'",
            ));
        }

        let mut values = [0.0f64; 4];
        for (slot, (part, label)) in values
            .iter_mut()
            .zip(parts.iter().zip(["west", "south", "east", "north"]))
        {
            *slot = part
                .parse::<f64>()
                .map_err(|_| GenMapError::invalid("bbox", format!("Invalid {}: {}", label, part)))?;
        }

        let [west, south, east, north] = values;
        Extent::new(north, south, east, west)
    }
}

/// Upper bound on the number of ticks along one axis
pub const MAX_TICKS: usize = 10_000;

/// Number of ticks [`tick_positions`] would produce, checked before allocation
pub fn tick_count(start: f64, stop: f64, step: f64, init: f64) -> Result<usize> {
    if !step.is_finite() || step <= 0.0 {
        return Err(GenMapError::invalid(
            "tick_step",
            format!("tick step must be positive, got {}", step),
        ));
    }
    if !(start + init).is_finite() || !stop.is_finite() {
        return Err(GenMapError::invalid(
            "tick_init",
            format!("tick origin must be finite, got {} + {}", start, init),
        ));
    }

    let count = ((stop + step - (start + init)) / step).ceil().max(0.0);
    if !count.is_finite() || count > MAX_TICKS as f64 {
        return Err(GenMapError::invalid(
            "tick_step",
            format!(
                "step {} gives {} ticks over [{}, {}], at most {} allowed",
                step, count, start, stop, MAX_TICKS
            ),
        ));
    }
    Ok(count as usize)
}

/// Tick positions from `start + init` up to, but excluding, `stop + step`
pub fn tick_positions(start: f64, stop: f64, step: f64, init: f64) -> Result<Vec<f64>> {
    let count = tick_count(start, stop, step, init)?;
    let first = start + init;
    Ok((0..count).map(|i| first + i as f64 * step).collect())
}

/// Great-circle distance in kilometres between two `(lat, lon)` points
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Length of one degree of longitude at `lat`, in kilometres
pub fn km_per_degree_lon(lat: f64) -> f64 {
    haversine_km(lat, 0.0, lat, 1.0)
}
