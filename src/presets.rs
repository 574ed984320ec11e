//! Field presets for oceanographic variables.
//!
//! Each known field identifier maps to a colormap, a normalization and an
//! optional overlay. The table is closed: unknown identifiers are an error,
//! never a silent default.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{GenMapError, Result};

/// Colormap used for `current` when the companion palettes are unavailable
pub const CURRENT_FALLBACK_COLORMAP: &str = "viridis";

/// Companion palette preferred for `current`
pub const COMPANION_SPEED_COLORMAP: &str = "cmo.speed";

/// How data values are mapped onto the colormap's `[0, 1]` domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    Linear,
    Logarithmic,
    /// Two linear halves meeting at zero, which maps to the colormap center
    DivergingCentered,
}

impl Normalization {
    /// Normalize `value` against `[vmin, vmax]`.
    ///
    /// Returns `None` for values the normalization masks out: non-finite
    /// values, and non-positive values on a logarithmic scale.
    pub fn normalize(&self, value: f32, vmin: f32, vmax: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }

        let t = match self {
            Normalization::Linear => {
                if vmax > vmin {
                    (value - vmin) / (vmax - vmin)
                } else {
                    0.5
                }
            }
            Normalization::Logarithmic => {
                if value <= 0.0 {
                    return None;
                }
                if vmin > 0.0 && vmax > vmin {
                    (value.ln() - vmin.ln()) / (vmax.ln() - vmin.ln())
                } else {
                    0.5
                }
            }
            Normalization::DivergingCentered => {
                if value < 0.0 && vmin < 0.0 {
                    0.5 - 0.5 * (value / vmin)
                } else if value > 0.0 && vmax > 0.0 {
                    0.5 + 0.5 * (value / vmax)
                } else {
                    0.5
                }
            }
        };

        Some(t.clamp(0.0, 1.0))
    }

    /// Default color limits for a set of values.
    ///
    /// Linear uses the finite extrema, logarithmic the positive extrema and
    /// diverging a range symmetric about zero.
    pub fn auto_limits<'a, I>(&self, values: I) -> Option<(f32, f32)>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in values {
            if !v.is_finite() || (*self == Normalization::Logarithmic && v <= 0.0) {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
        }

        if min > max {
            return None;
        }

        match self {
            Normalization::DivergingCentered => {
                let bound = min.abs().max(max.abs());
                Some((-bound, bound))
            }
            _ => Some((min, max)),
        }
    }
}

/// Additional layer drawn over the color field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    None,
    VectorQuiver,
    Streamlines,
}

/// Visualization defaults for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPreset {
    pub field: String,
    pub colormap: String,
    pub normalization: Normalization,
    pub overlay: Overlay,
    pub label: String,
}

/// Optional capabilities resolved once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The companion ocean palettes (`cmo.*`) are registered
    pub companion_palettes: bool,
}

enum ColormapChoice {
    Fixed(&'static str),
    Companion {
        preferred: &'static str,
        fallback: &'static str,
    },
}

struct PresetEntry {
    colormap: ColormapChoice,
    normalization: Normalization,
    overlay: Overlay,
    label: &'static str,
}

/// Known field identifiers in table order
pub const FIELD_IDS: &[&str] = &["sst", "chl", "sla", "wind", "current"];

static PRESETS: Lazy<HashMap<&'static str, PresetEntry>> = Lazy::new(|| {
    HashMap::from([
        (
            "sst",
            PresetEntry {
                colormap: ColormapChoice::Fixed("genmap_sst"),
                normalization: Normalization::Linear,
                overlay: Overlay::None,
                label: "Sea Surface Temperature (°C)",
            },
        ),
        (
            "chl",
            PresetEntry {
                colormap: ColormapChoice::Fixed("viridis"),
                normalization: Normalization::Logarithmic,
                overlay: Overlay::None,
                label: "Chlorophyll-a (mg m⁻³)",
            },
        ),
        (
            "sla",
            PresetEntry {
                colormap: ColormapChoice::Fixed("RdBu_r"),
                normalization: Normalization::DivergingCentered,
                overlay: Overlay::None,
                label: "Sea Level Anomaly (cm)",
            },
        ),
        (
            "wind",
            PresetEntry {
                colormap: ColormapChoice::Fixed("plasma"),
                normalization: Normalization::Linear,
                overlay: Overlay::VectorQuiver,
                label: "Wind speed (m s⁻¹)",
            },
        ),
        (
            "current",
            PresetEntry {
                colormap: ColormapChoice::Companion {
                    preferred: COMPANION_SPEED_COLORMAP,
                    fallback: CURRENT_FALLBACK_COLORMAP,
                },
                normalization: Normalization::Linear,
                overlay: Overlay::Streamlines,
                label: "Current speed (m s⁻¹)",
            },
        ),
    ])
});

/// Resolves field identifiers to presets for a fixed set of capabilities
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetResolver {
    capabilities: Capabilities,
}

impl PresetResolver {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Look up the preset for `field_id`
    pub fn get_preset(&self, field_id: &str) -> Result<FieldPreset> {
        let entry = PRESETS
            .get(field_id)
            .ok_or_else(|| GenMapError::UnknownField {
                field: field_id.to_string(),
            })?;

        let colormap = match entry.colormap {
            ColormapChoice::Fixed(name) => name,
            ColormapChoice::Companion {
                preferred,
                fallback,
            } => {
                if self.capabilities.companion_palettes {
                    preferred
                } else {
                    fallback
                }
            }
        };

        Ok(FieldPreset {
            field: field_id.to_string(),
            colormap: colormap.to_string(),
            normalization: entry.normalization,
            overlay: entry.overlay,
            label: entry.label.to_string(),
        })
    }

    pub fn field_ids(&self) -> &'static [&'static str] {
        FIELD_IDS
    }

    /// Every preset in table order
    pub fn presets(&self) -> Vec<FieldPreset> {
        FIELD_IDS
            .iter()
            .filter_map(|id| self.get_preset(id).ok())
            .collect()
    }
}
