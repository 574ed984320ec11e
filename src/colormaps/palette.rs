//! Palette definitions and the continuous colormaps built from them.

use colorgrad::Color;
use serde::Serialize;

use super::colormap::{lerp_color, rgba8, Colormap};
use crate::error::{GenMapError, Result};

/// Color model declared by a palette source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorModel {
    #[default]
    Rgb,
    Hsv,
}

/// A position on the palette's own scale and the color it maps to
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoint {
    pub position: f64,
    pub color: Color,
}

impl ControlPoint {
    pub fn new(position: f64, color: Color) -> Self {
        Self { position, color }
    }
}

/// An ordered, validated sequence of control points.
///
/// Positions are non-decreasing and span a range of non-zero width. Repeated
/// positions describe a hard step between two colors.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteDefinition {
    points: Vec<ControlPoint>,
    model: ColorModel,
    background: Option<Color>,
    foreground: Option<Color>,
    nan_color: Option<Color>,
}

impl PaletteDefinition {
    /// Build a definition, checking the ordering invariants
    pub fn new(points: Vec<ControlPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(GenMapError::MalformedPalette {
                line: None,
                message: format!(
                    "a palette needs at least two control points, found {}",
                    points.len()
                ),
            });
        }

        if let Some(bad) = points.iter().find(|p| !p.position.is_finite()) {
            return Err(GenMapError::MalformedPalette {
                line: None,
                message: format!("control point position {} is not finite", bad.position),
            });
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].position < w[0].position) {
            return Err(GenMapError::MalformedPalette {
                line: None,
                message: format!(
                    "positions must be non-decreasing: {} follows {}",
                    pair[1].position, pair[0].position
                ),
            });
        }

        let min = points[0].position;
        let max = points[points.len() - 1].position;
        if max <= min {
            return Err(GenMapError::MalformedPalette {
                line: None,
                message: format!("palette range has zero width at {}", min),
            });
        }

        Ok(Self {
            points,
            model: ColorModel::Rgb,
            background: None,
            foreground: None,
            nan_color: None,
        })
    }

    /// Evenly spaced colors over `[0, 1]`
    pub fn from_colors(colors: Vec<Color>) -> Result<Self> {
        let last = colors.len().saturating_sub(1).max(1) as f64;
        let points = colors
            .into_iter()
            .enumerate()
            .map(|(i, color)| ControlPoint::new(i as f64 / last, color))
            .collect();
        Self::new(points)
    }

    pub fn with_model(mut self, model: ColorModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }

    pub fn with_foreground(mut self, color: Option<Color>) -> Self {
        self.foreground = color;
        self
    }

    pub fn with_nan_color(mut self, color: Option<Color>) -> Self {
        self.nan_color = color;
        self
    }

    /// The same palette traversed from the maximum back to the minimum
    pub fn reversed(&self) -> Self {
        let min = self.min();
        let max = self.max();
        let points = self
            .points
            .iter()
            .rev()
            .map(|p| ControlPoint::new(min + max - p.position, p.color.clone()))
            .collect();
        Self {
            points,
            model: self.model,
            background: self.foreground.clone(),
            foreground: self.background.clone(),
            nan_color: self.nan_color.clone(),
        }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    pub fn background(&self) -> Option<&Color> {
        self.background.as_ref()
    }

    pub fn foreground(&self) -> Option<&Color> {
        self.foreground.as_ref()
    }

    pub fn nan_color(&self) -> Option<&Color> {
        self.nan_color.as_ref()
    }

    pub fn min(&self) -> f64 {
        self.points[0].position
    }

    pub fn max(&self) -> f64 {
        self.points[self.points.len() - 1].position
    }

    /// Serializable summary of the definition
    pub fn summary(&self) -> PaletteSummary {
        PaletteSummary {
            model: self.model,
            min: self.min(),
            max: self.max(),
            points: self
                .points
                .iter()
                .map(|p| (p.position, rgba8(&p.color)))
                .collect(),
            background: self.background.as_ref().map(rgba8),
            foreground: self.foreground.as_ref().map(rgba8),
            nan_color: self.nan_color.as_ref().map(rgba8),
        }
    }
}

/// JSON view of a palette, used by the command-line tool
#[derive(Debug, Clone, Serialize)]
pub struct PaletteSummary {
    pub model: ColorModel,
    pub min: f64,
    pub max: f64,
    pub points: Vec<(f64, [u8; 4])>,
    pub background: Option<[u8; 4]>,
    pub foreground: Option<[u8; 4]>,
    pub nan_color: Option<[u8; 4]>,
}

/// Continuous colormap over a palette, with positions rescaled to `[0, 1]`
pub struct PaletteColormap {
    name: String,
    stops: Vec<(f64, Color)>,
    nan_color: Option<Color>,
}

impl PaletteColormap {
    pub fn new(name: &str, definition: &PaletteDefinition) -> Self {
        let min = definition.min();
        let span = definition.max() - min;
        let stops = definition
            .points()
            .iter()
            .map(|p| ((p.position - min) / span, p.color.clone()))
            .collect();

        Self {
            name: name.to_string(),
            stops,
            nan_color: definition.nan_color().cloned(),
        }
    }
}

impl Colormap for PaletteColormap {
    fn eval(&self, t: f64) -> Color {
        // Number of stops at or below t; at a repeated position the later stop wins
        let above = self.stops.partition_point(|(position, _)| *position <= t);

        if above == 0 {
            return self.stops[0].1.clone();
        }
        if above == self.stops.len() {
            return self.stops[above - 1].1.clone();
        }

        let (p0, c0) = &self.stops[above - 1];
        let (p1, c1) = &self.stops[above];
        lerp_color(c0, c1, (t - p0) / (p1 - p0))
    }

    fn bad_color(&self) -> Option<Color> {
        self.nan_color.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
