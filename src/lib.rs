//! # genmap
//!
//! Oceanographic map generation: named colormaps, field presets and a thin
//! map builder.
//!
//! ## Key Features
//!
//! - **CPT palettes**: Parse GMT-style color palette tables into continuous colormaps
//! - **Colormap registry**: Library colormaps, bundled ocean palettes and user files under one namespace
//! - **Field presets**: Colormap, normalization and overlay defaults per ocean variable
//! - **Map builder**: Render gridded fields to PNG or JPEG with gridlines, vectors and a scale bar
//!
//! ## Architecture
//!
//! - **Colormaps**: [`colormaps`] parses palettes and owns the name-to-colormap registry
//! - **Presets**: [`presets`] resolves field identifiers to visualization defaults
//! - **Rendering**: [`map`] samples [`grid`] data through [`interpolation`] onto a raster

pub mod colormaps;
pub mod config;
pub mod error;
pub mod geo;
pub mod grid;
pub mod interpolation;
pub mod logging;
pub mod map;
pub mod presets;

pub use colormaps::{parse_palette, Colormap, ColormapHandle, ColormapRegistry, PaletteDefinition};
pub use config::Config;
pub use error::{GenMapError, Result};
pub use geo::Extent;
pub use grid::{Grid, GridFile, VectorGrid};
pub use logging::{
    init_tracing, log_error, log_operation_end, log_operation_start, log_registry_stats,
    log_timed_operation,
};
pub use map::{GenMap, Limits, MapOptions, OutputFormat};
pub use presets::{Capabilities, FieldPreset, Normalization, Overlay, PresetResolver};
