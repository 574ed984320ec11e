//! Colormaps: CPT parsing, palette interpolation and the named registry.

pub mod builtin;
pub mod colormap;
pub mod cpt;
pub mod palette;
pub mod registry;

pub use colormap::{rgba8, Colormap, ColormapHandle, Discretized};
pub use cpt::parse_palette;
pub use palette::{ColorModel, ControlPoint, PaletteColormap, PaletteDefinition, PaletteSummary};
pub use registry::ColormapRegistry;
