//! genmap - oceanographic map generation
//!
//! This is the main entry point for the genmap command-line tool.

use anyhow::Context;
use std::time::Instant;
use tracing::{error, info};

use genmap::config::Command;
use genmap::map::{MapOptions, Orientation};
use genmap::{
    init_tracing, log_error, log_operation_end, log_operation_start, log_registry_stats,
    parse_palette, ColormapRegistry, Config, GenMap, GridFile, Limits, PresetResolver,
};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let (config, command) = Config::load().context("Configuration error")?;

    init_tracing(&config.log_level);
    info!("Starting genmap v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let resolver = PresetResolver::new(config.capabilities());

    match command {
        Command::Presets => {
            println!("{}", serde_json::to_string_pretty(&resolver.presets())?);
        }
        Command::Palette { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("CPT file not found: {}", file.display()))?;
            let definition = parse_palette(&source).map_err(|e| {
                log_error(&e, "palette");
                e
            })?;
            println!("{}", serde_json::to_string_pretty(&definition.summary())?);
        }
        Command::Colormaps => {
            let registry = ColormapRegistry::with_defaults(&config.palettes)?;
            log_registry_stats(&registry);
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Command::Render {
            ref grid,
            ref field,
            ref output,
            vmin,
            vmax,
            scalebar_km,
            colorbar,
            ..
        } => {
            let start = Instant::now();
            log_operation_start("render", Some(field.as_str()));

            let registry = ColormapRegistry::with_defaults(&config.palettes)?;
            let grid_file = GridFile::from_path(grid)
                .with_context(|| format!("Failed to load grid {}", grid.display()))?;
            let extent = command.extent()?;
            let options = MapOptions {
                width: config.render.width,
                height: config.render.height,
                resampling: config.render.resampling.clone(),
                ..Default::default()
            };

            let mut map = GenMap::new(extent, options, &registry, &resolver)?;
            let preset = map
                .render_field(field, &grid_file.scalar()?, Limits { vmin, vmax })
                .map_err(|e| {
                    log_error(&e, "render_field");
                    e
                })?;
            if let Some(vectors) = grid_file.vectors()? {
                map.render_overlay(&preset, &vectors)?;
            }
            if let Some(length_km) = scalebar_km {
                let bar = map.add_scalebar(length_km, (0.5, 0.05))?;
                info!(label = %bar.label, "Added scale bar");
            }
            if colorbar {
                let (x0, y0) = extent.at_fraction(0.2, 0.12);
                let (x1, y1) = extent.at_fraction(0.8, 0.16);
                map.add_colorbar_by_coords(x0, y0, x1, y1, Orientation::Horizontal)?;
            }
            map.save(output)?;

            log_operation_end("render", start, true);
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
    }

    Ok(())
}
