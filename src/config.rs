//! Configuration management for genmap.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GenMapError, Result};
use crate::geo::Extent;
use crate::interpolation::INTERPOLATION_METHODS;
use crate::presets::Capabilities;

/// Command-line arguments for genmap
#[derive(Parser, Debug)]
#[command(name = "genmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to JSON configuration file
    #[arg(short, long, env = "GENMAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GENMAP_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory of extra `*.cpt` palettes to register by file name
    #[arg(long, env = "GENMAP_PALETTE_DIR", global = true)]
    pub palette_dir: Option<PathBuf>,

    /// Register the companion ocean palettes (cmo.*)
    #[arg(long, env = "GENMAP_COMPANION_PALETTES", global = true)]
    pub companion_palettes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the field preset table as JSON
    Presets,

    /// Parse a CPT file and print its summary as JSON
    Palette {
        /// Path to the CPT file
        file: PathBuf,
    },

    /// List registered colormap names
    Colormaps,

    /// Render a field from a JSON grid file to PNG or JPEG
    Render {
        /// JSON grid with `lat`, `lon` and `values` and/or `u`/`v`
        #[arg(long)]
        grid: PathBuf,

        /// Field identifier (sst, chl, sla, wind, current)
        #[arg(long)]
        field: String,

        /// Output image; the extension selects the format
        #[arg(short, long)]
        output: PathBuf,

        /// Map bounds as `west,south,east,north`
        #[arg(
            long,
            allow_hyphen_values = true,
            conflicts_with_all = ["north", "south", "east", "west"]
        )]
        bbox: Option<Extent>,

        #[arg(long, allow_hyphen_values = true, required_unless_present = "bbox")]
        north: Option<f64>,

        #[arg(long, allow_hyphen_values = true, required_unless_present = "bbox")]
        south: Option<f64>,

        #[arg(long, allow_hyphen_values = true, required_unless_present = "bbox")]
        east: Option<f64>,

        #[arg(long, allow_hyphen_values = true, required_unless_present = "bbox")]
        west: Option<f64>,

        /// Lower color limit
        #[arg(long, allow_hyphen_values = true)]
        vmin: Option<f32>,

        /// Upper color limit
        #[arg(long, allow_hyphen_values = true)]
        vmax: Option<f32>,

        /// Draw a scale bar of this length in kilometres
        #[arg(long)]
        scalebar_km: Option<f64>,

        /// Draw a horizontal colorbar along the bottom of the map
        #[arg(long)]
        colorbar: bool,

        /// Image width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Image height in pixels
        #[arg(long)]
        height: Option<u32>,
    },
}

impl Command {
    /// Map bounds of a `render` command, from `--bbox` or the four edges
    pub fn extent(&self) -> Result<Extent> {
        match self {
            Command::Render { bbox: Some(extent), .. } => Ok(*extent),
            Command::Render {
                north: Some(north),
                south: Some(south),
                east: Some(east),
                west: Some(west),
                ..
            } => Extent::new(*north, *south, *east, *west),
            Command::Render { .. } => Err(GenMapError::invalid(
                "extent",
                "give --bbox or all of --north, --south, --east and --west",
            )),
            _ => Err(GenMapError::invalid("extent", "only render takes map bounds")),
        }
    }
}

/// Palette sources registered at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteConfig {
    /// Directory of extra CPT files
    #[serde(default)]
    pub extra_dir: Option<PathBuf>,

    /// Whether the companion palettes are registered
    #[serde(default)]
    pub companion_palettes: bool,
}

/// Rendering defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Grid sampling method
    #[serde(default = "default_resampling")]
    pub resampling: String,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub palettes: PaletteConfig,

    #[serde(default)]
    pub render: RenderConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, Command)> {
        Self::from_cli(Cli::parse())
    }

    /// Build the configuration from already parsed arguments
    pub fn from_cli(cli: Cli) -> Result<(Self, Command)> {
        // Start with defaults
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        if let Some(level) = cli.log_level {
            config.log_level = level;
        }
        if cli.palette_dir.is_some() {
            config.palettes.extra_dir = cli.palette_dir;
        }
        if cli.companion_palettes {
            config.palettes.companion_palettes = true;
        }
        if let Command::Render { width, height, .. } = &cli.command {
            if let Some(width) = width {
                config.render.width = *width;
            }
            if let Some(height) = height {
                config.render.height = *height;
            }
        }

        Ok((config, cli.command))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GenMapError::Config {
            message: format!("Cannot read config file {}: {}", path.display(), e),
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.palettes.extra_dir.is_some() {
            self.palettes.extra_dir = other.palettes.extra_dir;
        }
        self.palettes.companion_palettes |= other.palettes.companion_palettes;
        self.render = other.render;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(GenMapError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        if self.render.width < 2 || self.render.height < 2 {
            return Err(GenMapError::Config {
                message: format!(
                    "Image size must be at least 2x2, got {}x{}",
                    self.render.width, self.render.height
                ),
            });
        }

        if !INTERPOLATION_METHODS.contains(&self.render.resampling.as_str()) {
            return Err(GenMapError::Config {
                message: format!(
                    "Invalid resampling method: {}. Must be one of: {}",
                    self.render.resampling,
                    INTERPOLATION_METHODS.join(", ")
                ),
            });
        }

        if let Some(dir) = &self.palettes.extra_dir {
            if !dir.is_dir() {
                return Err(GenMapError::Config {
                    message: format!("Palette directory does not exist: {}", dir.display()),
                });
            }
        }

        Ok(())
    }

    /// Capabilities the preset resolver works with
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            companion_palettes: self.palettes.companion_palettes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palettes: PaletteConfig::default(),
            render: RenderConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            resampling: default_resampling(),
        }
    }
}

// Default value functions for serde
fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_resampling() -> String {
    "bilinear".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
