//! Colormap trait and utilities.
//!
//! This module defines the common interface for all colormaps and the
//! handle type the registry hands out.

use std::sync::Arc;

use colorgrad::Color;

use crate::error::{GenMapError, Result};

/// Trait for color mapping implementations
pub trait Colormap: Send + Sync {
    /// Evaluate the colormap at a normalized position in `[0, 1]`.
    ///
    /// Positions outside the unit interval are clamped to the boundary colors.
    fn eval(&self, t: f64) -> Color;

    /// Map a normalized value (0.0 to 1.0) to an RGBA color
    fn map_normalized(&self, value: f32) -> [u8; 4] {
        rgba8(&self.eval(value as f64))
    }

    /// Map a value to an RGBA color given the data range
    fn map(&self, value: f32, min: f32, max: f32) -> [u8; 4] {
        let normalized = if max > min {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.map_normalized(normalized)
    }

    /// Color used for missing values, if the colormap defines one
    fn bad_color(&self) -> Option<Color> {
        None
    }

    /// Get the name of this colormap
    fn name(&self) -> &str;
}

/// Shared, immutable colormap as handed out by the registry
pub type ColormapHandle = Arc<dyn Colormap>;

/// A colormap quantized into a fixed number of flat color bands.
///
/// Band `i` of `n` takes the color of the parent at `i / (n - 1)`.
pub struct Discretized {
    inner: ColormapHandle,
    levels: usize,
}

impl Discretized {
    pub fn new(inner: ColormapHandle, levels: usize) -> Result<Self> {
        if levels < 2 {
            return Err(GenMapError::invalid(
                "levels",
                format!("a discrete colormap needs at least 2 levels, got {}", levels),
            ));
        }
        Ok(Self { inner, levels })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }
}

impl Colormap for Discretized {
    fn eval(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.levels - 1;
        let band = ((t * self.levels as f64).floor() as usize).min(last);
        self.inner.eval(band as f64 / last as f64)
    }

    fn bad_color(&self) -> Option<Color> {
        self.inner.bad_color()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Linear interpolation between two colors, channel by channel
pub fn lerp_color(c1: &Color, c2: &Color, t: f64) -> Color {
    Color::new(
        c1.r * (1.0 - t) + c2.r * t,
        c1.g * (1.0 - t) + c2.g * t,
        c1.b * (1.0 - t) + c2.b * t,
        c1.a * (1.0 - t) + c2.a * t,
    )
}

/// Convert a floating-point color to 8-bit RGBA
pub fn rgba8(color: &Color) -> [u8; 4] {
    let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp;

    impl Colormap for Ramp {
        fn eval(&self, t: f64) -> Color {
            let t = t.clamp(0.0, 1.0);
            Color::new(t, t, t, 1.0)
        }

        fn name(&self) -> &str {
            "ramp"
        }
    }

    #[test]
    fn test_lerp_color() {
        let black = Color::new(0.0, 0.0, 0.0, 1.0);
        let white = Color::new(1.0, 1.0, 1.0, 1.0);

        let mid = lerp_color(&black, &white, 0.5);
        assert_eq!(rgba8(&mid), [128, 128, 128, 255]);

        assert_eq!(lerp_color(&black, &white, 0.0), black);
        assert_eq!(lerp_color(&black, &white, 1.0), white);
    }

    #[test]
    fn test_map_with_range() {
        let ramp = Ramp;
        assert_eq!(ramp.map(10.0, 0.0, 10.0), [255, 255, 255, 255]);
        assert_eq!(ramp.map(-5.0, 0.0, 10.0), [0, 0, 0, 255]);
        // Degenerate range falls back to the midpoint
        assert_eq!(ramp.map(3.0, 1.0, 1.0), [128, 128, 128, 255]);
    }

    #[test]
    fn test_discretized_bands() {
        let stepped = Discretized::new(Arc::new(Ramp), 4).unwrap();
        assert_eq!(stepped.levels(), 4);

        let mut seen: Vec<[u8; 4]> = (0..=100)
            .map(|i| stepped.map_normalized(i as f32 / 100.0))
            .collect();
        seen.dedup();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], [0, 0, 0, 255]);
        assert_eq!(seen[3], [255, 255, 255, 255]);
    }

    #[test]
    fn test_discretized_rejects_single_level() {
        assert!(Discretized::new(Arc::new(Ramp), 1).is_err());
    }
}
