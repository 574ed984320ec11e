//! Map builder.
//!
//! [`GenMap`] renders fields on an equirectangular (plate carrée) canvas:
//! the color field from a preset, vector or streamline overlays, dashed
//! gridlines with degree labels at tick positions, a labelled scale bar, a
//! colorbar placed in map coordinates and caller-supplied coastlines.
//!
//! Pixel `(0, 0)` is the north-west corner of the extent.

pub mod draw;

use image::{imageops, DynamicImage, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::colormaps::{rgba8, ColormapHandle, ColormapRegistry};
use crate::error::{GenMapError, Result};
use crate::geo::{km_per_degree_lon, tick_count, tick_positions, Extent};
use crate::grid::{Grid, VectorGrid};
use crate::interpolation::{get_interpolator, Interpolator};
use crate::logging::log_timed_operation;
use crate::presets::{FieldPreset, Normalization, Overlay, PresetResolver};
use draw::{draw_arrow, draw_line, draw_polyline, draw_text, Align, Stroke};

/// Pixels per inch used to size quiver arrows
pub const QUIVER_DPI: f64 = 100.0;

const BLACK: [u8; 4] = [0, 0, 0, 255];
const GRIDLINE: [u8; 4] = [0, 0, 0, 77];
const STREAMLINE: [u8; 4] = [40, 40, 40, 220];

/// Font size of tick, scale bar and colorbar labels, in pixels
pub const LABEL_SIZE: f32 = 12.0;

/// A line in geographic coordinates, as `(lon, lat)` pairs
pub type Polyline = Vec<(f64, f64)>;

/// Canvas and decoration settings
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub width: u32,
    pub height: u32,
    /// Tick spacing in degrees, `(lat, lon)`
    pub tick_step: (f64, f64),
    /// Tick offset from the south/west edge in degrees, `(lat, lon)`
    pub tick_init: (f64, f64),
    pub gridlines: bool,
    /// Label gridlines with their latitude and longitude
    pub tick_labels: bool,
    /// Grid sampling method, see [`crate::interpolation::get_interpolator`]
    pub resampling: String,
    pub background: [u8; 4],
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            tick_step: (1.0, 1.0),
            tick_init: (0.0, 0.0),
            gridlines: true,
            tick_labels: true,
            resampling: "bilinear".to_string(),
            background: [255, 255, 255, 255],
        }
    }
}

/// Color limits; unset bounds are derived from the data
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limits {
    pub vmin: Option<f32>,
    pub vmax: Option<f32>,
}

impl Limits {
    pub fn new(vmin: f32, vmax: f32) -> Self {
        Self {
            vmin: Some(vmin),
            vmax: Some(vmax),
        }
    }
}

/// Quiver arrow settings
#[derive(Debug, Clone, Copy)]
pub struct QuiverOptions {
    /// Draw every `step`-th grid point in each direction
    pub step: usize,
    /// Data units per inch of arrow length
    pub scale: f64,
}

impl Default for QuiverOptions {
    fn default() -> Self {
        Self {
            step: 1,
            scale: 25.0,
        }
    }
}

/// Streamline seeding and integration settings
#[derive(Debug, Clone, Copy)]
pub struct StreamlineOptions {
    /// Distance between seed points in pixels
    pub spacing: u32,
    /// Integration step in pixels
    pub step: f64,
    pub max_steps: usize,
}

impl Default for StreamlineOptions {
    fn default() -> Self {
        Self {
            spacing: 30,
            step: 1.0,
            max_steps: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Encoded image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| GenMapError::invalid("output", "output file has no extension"))?
            .parse()
    }
}

impl FromStr for OutputFormat {
    type Err = GenMapError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            other => Err(GenMapError::invalid(
                "format",
                format!("Format must be 'png' or 'jpeg', got '{}'", other),
            )),
        }
    }
}

/// A drawn scale bar
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub length_km: f64,
    pub km_per_degree: f64,
    pub lon_left: f64,
    pub lon_right: f64,
    pub lat: f64,
    pub label: String,
}

/// Pixel rectangle a colorbar occupies on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorbarPlacement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

struct ActiveLayer {
    colormap: ColormapHandle,
    normalization: Normalization,
    vmin: f32,
    vmax: f32,
    label: String,
}

/// A map under construction
pub struct GenMap<'a> {
    extent: Extent,
    options: MapOptions,
    registry: &'a ColormapRegistry,
    resolver: &'a PresetResolver,
    canvas: RgbaImage,
    layer: Option<ActiveLayer>,
    colorbar: Option<ColorbarPlacement>,
}

impl<'a> GenMap<'a> {
    pub fn new(
        extent: Extent,
        options: MapOptions,
        registry: &'a ColormapRegistry,
        resolver: &'a PresetResolver,
    ) -> Result<Self> {
        extent.validate()?;
        if options.width < 2 || options.height < 2 {
            return Err(GenMapError::invalid(
                "size",
                format!(
                    "map must be at least 2x2 pixels, got {}x{}",
                    options.width, options.height
                ),
            ));
        }
        // Fail early on a bad sampling method rather than at first render
        get_interpolator(&options.resampling)?;
        tick_count(extent.south, extent.north, options.tick_step.0, options.tick_init.0)?;
        tick_count(extent.west, extent.east, options.tick_step.1, options.tick_init.1)?;

        let canvas = ImageBuffer::from_pixel(options.width, options.height, Rgba(options.background));
        debug!(
            north = extent.north,
            south = extent.south,
            east = extent.east,
            west = extent.west,
            width = options.width,
            height = options.height,
            "Created map canvas"
        );

        Ok(Self {
            extent,
            options,
            registry,
            resolver,
            canvas,
            layer: None,
            colorbar: None,
        })
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Label of the last rendered field, if any
    pub fn label(&self) -> Option<&str> {
        self.layer.as_ref().map(|layer| layer.label.as_str())
    }

    /// Color limits of the last rendered field, if any
    pub fn limits(&self) -> Option<(f32, f32)> {
        self.layer.as_ref().map(|layer| (layer.vmin, layer.vmax))
    }

    /// Pixel position of a geographic point
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon - self.extent.west) / self.extent.width() * (self.options.width - 1) as f64;
        let y = (self.extent.north - lat) / self.extent.height() * (self.options.height - 1) as f64;
        (x, y)
    }

    /// Geographic `(lon, lat)` of a pixel position
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.extent.west + x / (self.options.width - 1) as f64 * self.extent.width();
        let lat = self.extent.north - y / (self.options.height - 1) as f64 * self.extent.height();
        (lon, lat)
    }

    /// Tick positions in degrees, `(latitudes, longitudes)`
    pub fn ticks(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let e = &self.extent;
        let (step, init) = (self.options.tick_step, self.options.tick_init);
        Ok((
            tick_positions(e.south, e.north, step.0, init.0)?,
            tick_positions(e.west, e.east, step.1, init.1)?,
        ))
    }

    /// Render a field with its preset colormap and normalization.
    ///
    /// Returns the preset so the caller can supply the matching overlay.
    pub fn render_field(&mut self, field_id: &str, grid: &Grid, limits: Limits) -> Result<FieldPreset> {
        log_timed_operation("render_field", || {
            let preset = self.resolver.get_preset(field_id)?;
            let colormap = self.registry.resolve(&preset.colormap)?;
            self.paint(grid, colormap, preset.normalization, limits, &preset.label)?;
            info!(
                field = field_id,
                colormap = %preset.colormap,
                normalization = ?preset.normalization,
                overlay = ?preset.overlay,
                "Rendered field"
            );
            Ok(preset)
        })
    }

    /// Filled rendering with an explicit colormap, optionally quantized into `levels` bands
    pub fn contourf(
        &mut self,
        grid: &Grid,
        colormap: &str,
        normalization: Normalization,
        limits: Limits,
        levels: Option<usize>,
    ) -> Result<()> {
        let handle = match levels {
            Some(levels) => self.registry.resolve_discrete(colormap, levels)?,
            None => self.registry.resolve(colormap)?,
        };
        self.paint(grid, handle, normalization, limits, "")
    }

    fn paint(
        &mut self,
        grid: &Grid,
        colormap: ColormapHandle,
        normalization: Normalization,
        limits: Limits,
        label: &str,
    ) -> Result<()> {
        let (auto_min, auto_max) = match normalization.auto_limits(grid.values().iter()) {
            Some(limits) => limits,
            None => {
                // Nothing to scale: every pixel normalizes to missing
                warn!(
                    colormap = colormap.name(),
                    normalization = ?normalization,
                    "Field has no usable values, all pixels are masked"
                );
                placeholder_limits(normalization)
            }
        };
        let vmin = limits.vmin.unwrap_or(auto_min);
        let vmax = limits.vmax.unwrap_or(auto_max);

        if !vmin.is_finite() || !vmax.is_finite() || vmin > vmax {
            return Err(GenMapError::invalid(
                "limits",
                format!("invalid color limits [{}, {}]", vmin, vmax),
            ));
        }
        if normalization == Normalization::Logarithmic && vmin <= 0.0 {
            return Err(GenMapError::invalid(
                "limits",
                format!("logarithmic scale needs positive limits, got vmin = {}", vmin),
            ));
        }

        let interpolator: Box<dyn Interpolator> = get_interpolator(&self.options.resampling)?;
        let values = grid.values().view();
        let bad = colormap.bad_color().map(|c| rgba8(&c));
        let start = Instant::now();
        let mut painted = 0usize;
        let mut masked = 0usize;

        for py in 0..self.options.height {
            for px in 0..self.options.width {
                let (lon, lat) = self.unproject(px as f64, py as f64);
                let Some((row, col)) = grid.locate(lat, lon) else {
                    continue;
                };

                let value = interpolator.interpolate(&values, row, col);
                match normalization.normalize(value, vmin, vmax) {
                    Some(t) => {
                        self.canvas.put_pixel(px, py, Rgba(colormap.map_normalized(t)));
                        painted += 1;
                    }
                    None => {
                        if let Some(color) = bad {
                            self.canvas.put_pixel(px, py, Rgba(color));
                        }
                        masked += 1;
                    }
                }
            }
        }

        debug!(
            colormap = colormap.name(),
            vmin = vmin,
            vmax = vmax,
            painted = painted,
            masked = masked,
            interpolation = interpolator.name(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Painted color field"
        );

        self.layer = Some(ActiveLayer {
            colormap,
            normalization,
            vmin,
            vmax,
            label: label.to_string(),
        });
        Ok(())
    }

    /// Draw the overlay a preset asks for; a no-op for presets without one
    pub fn render_overlay(&mut self, preset: &FieldPreset, vectors: &VectorGrid) -> Result<usize> {
        match preset.overlay {
            Overlay::None => Ok(0),
            Overlay::VectorQuiver => self.quiver(vectors, QuiverOptions::default()),
            Overlay::Streamlines => self.streamlines(vectors, StreamlineOptions::default()),
        }
    }

    /// Draw vector arrows; returns the number of arrows drawn
    pub fn quiver(&mut self, vectors: &VectorGrid, options: QuiverOptions) -> Result<usize> {
        if options.step == 0 {
            return Err(GenMapError::invalid("step", "quiver step must be at least 1"));
        }
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(GenMapError::invalid("scale", "quiver scale must be positive"));
        }

        let stroke = Stroke::solid(BLACK, 1);
        let mut drawn = 0;
        for (i, &lat) in vectors.lat().iter().enumerate().step_by(options.step) {
            for (j, &lon) in vectors.lon().iter().enumerate().step_by(options.step) {
                let (u, v) = (vectors.u()[[i, j]] as f64, vectors.v()[[i, j]] as f64);
                let magnitude = u.hypot(v);
                if !magnitude.is_finite() || magnitude == 0.0 {
                    continue;
                }

                let (x, y) = self.project(lon, lat);
                if !self.on_canvas(x, y) {
                    continue;
                }

                let length = magnitude / options.scale * QUIVER_DPI;
                let tip = (x + u / magnitude * length, y - v / magnitude * length);
                draw_arrow(&mut self.canvas, (x, y), tip, &stroke);
                drawn += 1;
            }
        }

        debug!(arrows = drawn, step = options.step, scale = options.scale, "Drew quiver");
        Ok(drawn)
    }

    /// Trace streamlines from a regular lattice of seeds; returns the number drawn
    pub fn streamlines(&mut self, vectors: &VectorGrid, options: StreamlineOptions) -> Result<usize> {
        if options.spacing == 0 || !(options.step.is_finite() && options.step > 0.0) {
            return Err(GenMapError::invalid(
                "streamlines",
                "seed spacing and step must be positive",
            ));
        }

        let interpolator = get_interpolator("bilinear")?;
        let u = vectors.u().view();
        let v = vectors.v().view();
        let stroke = Stroke::solid(STREAMLINE, 1);
        let offset = options.spacing / 2;
        let mut drawn = 0;

        for sy in (offset..self.options.height).step_by(options.spacing as usize) {
            for sx in (offset..self.options.width).step_by(options.spacing as usize) {
                let mut path = vec![(sx as f64, sy as f64)];

                for _ in 0..options.max_steps {
                    let (x, y) = path[path.len() - 1];
                    let (lon, lat) = self.unproject(x, y);
                    let Some((row, col)) = vectors.locate(lat, lon) else {
                        break;
                    };

                    let du = interpolator.interpolate(&u, row, col) as f64;
                    let dv = interpolator.interpolate(&v, row, col) as f64;
                    let speed = du.hypot(dv);
                    if !speed.is_finite() || speed == 0.0 {
                        break;
                    }

                    let next = (x + du / speed * options.step, y - dv / speed * options.step);
                    if !self.on_canvas(next.0, next.1) {
                        break;
                    }
                    path.push(next);
                }

                if path.len() < 2 {
                    continue;
                }
                draw_polyline(&mut self.canvas, &path, &stroke);
                if path.len() > 10 {
                    let n = path.len();
                    draw_arrow(&mut self.canvas, path[n - 4], path[n - 1], &stroke);
                }
                drawn += 1;
            }
        }

        debug!(streamlines = drawn, "Drew streamlines");
        Ok(drawn)
    }

    /// Draw a horizontal scale bar of `length_km` centred at `location`, a
    /// fraction of the extent measured from the south-west corner.
    pub fn add_scalebar(&mut self, length_km: f64, location: (f64, f64)) -> Result<ScaleBar> {
        if !(length_km.is_finite() && length_km > 0.0) {
            return Err(GenMapError::invalid(
                "length_km",
                format!("scale bar length must be positive, got {}", length_km),
            ));
        }

        let km_per_degree = km_per_degree_lon(self.extent.mid_latitude());
        if km_per_degree < 1e-6 {
            return Err(GenMapError::invalid(
                "scalebar",
                "a scale bar cannot be drawn at the pole",
            ));
        }

        let degrees = length_km / km_per_degree;
        let (lon_center, lat) = self.extent.at_fraction(location.0, location.1);
        let bar = ScaleBar {
            length_km,
            km_per_degree,
            lon_left: lon_center - degrees / 2.0,
            lon_right: lon_center + degrees / 2.0,
            lat,
            label: format!("{} km", length_km),
        };

        let left = self.project(bar.lon_left, lat);
        let right = self.project(bar.lon_right, lat);
        let stroke = Stroke::solid(BLACK, 3);
        draw_line(&mut self.canvas, left, right, &stroke);
        for end in [left, right] {
            draw_line(&mut self.canvas, (end.0, end.1 - 4.0), (end.0, end.1 + 4.0), &Stroke::solid(BLACK, 1));
        }
        draw_text(
            &mut self.canvas,
            &bar.label,
            ((left.0 + right.0) / 2.0, left.1 - 6.0),
            (Align::Center, Align::End),
            LABEL_SIZE,
            BLACK,
        )?;

        debug!(
            length_km = length_km,
            km_per_degree = km_per_degree,
            lon_left = bar.lon_left,
            lon_right = bar.lon_right,
            "Drew scale bar"
        );
        Ok(bar)
    }

    /// Draw coastline or boundary polylines given in `(lon, lat)`
    pub fn add_coastlines(&mut self, lines: &[Polyline]) -> usize {
        let stroke = Stroke::solid(BLACK, 1);
        for line in lines {
            let pixels: Vec<(f64, f64)> = line.iter().map(|&(lon, lat)| self.project(lon, lat)).collect();
            draw_polyline(&mut self.canvas, &pixels, &stroke);
        }
        lines.len()
    }

    /// Strip image of the last rendered colormap
    pub fn colorbar(&self, length: u32, thickness: u32, orientation: Orientation) -> Result<RgbaImage> {
        let layer = self.layer.as_ref().ok_or_else(|| GenMapError::ImageGeneration {
            message: "no field has been rendered yet".to_string(),
        })?;
        if length < 2 || thickness == 0 {
            return Err(GenMapError::invalid("colorbar", "colorbar must be at least 2x1 pixels"));
        }

        let last = (length - 1) as f32;
        let strip = match orientation {
            Orientation::Horizontal => ImageBuffer::from_fn(length, thickness, |x, _| {
                Rgba(layer.colormap.map_normalized(x as f32 / last))
            }),
            Orientation::Vertical => ImageBuffer::from_fn(thickness, length, |_, y| {
                Rgba(layer.colormap.map_normalized(1.0 - y as f32 / last))
            }),
        };

        debug!(
            colormap = layer.colormap.name(),
            normalization = ?layer.normalization,
            "Built colorbar"
        );
        Ok(strip)
    }

    /// Place a colorbar for the current field in the rectangle spanned by
    /// the lower-left `(x0, y0)` and upper-right `(x1, y1)` corners, given as
    /// longitude and latitude. The part outside the map is cut off.
    ///
    /// The bar is drawn by [`GenMap::image`] on top of the gridlines, with the
    /// color limits at its ends and the field label above it.
    pub fn add_colorbar_by_coords(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        orientation: Orientation,
    ) -> Result<ColorbarPlacement> {
        if self.layer.is_none() {
            return Err(GenMapError::ImageGeneration {
                message: "no field has been rendered yet".to_string(),
            });
        }
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(GenMapError::invalid("colorbar", "corner coordinates must be finite"));
        }

        let (ax, ay) = self.project(x0, y0);
        let (bx, by) = self.project(x1, y1);
        let (w, h) = ((self.options.width - 1) as f64, (self.options.height - 1) as f64);
        let left = ax.min(bx).max(0.0).round();
        let right = ax.max(bx).min(w).round();
        let top = ay.min(by).max(0.0).round();
        let bottom = ay.max(by).min(h).round();
        if right < left || bottom < top {
            return Err(GenMapError::invalid(
                "colorbar",
                format!("colorbar corners ({}, {}) and ({}, {}) lie outside the map", x0, y0, x1, y1),
            ));
        }

        let placement = ColorbarPlacement {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32 + 1,
            height: (bottom - top) as u32 + 1,
            orientation,
        };
        let length = match orientation {
            Orientation::Horizontal => placement.width,
            Orientation::Vertical => placement.height,
        };
        if length < 2 {
            return Err(GenMapError::invalid(
                "colorbar",
                "colorbar must span at least 2 pixels along its orientation",
            ));
        }

        debug!(
            x = placement.x,
            y = placement.y,
            width = placement.width,
            height = placement.height,
            orientation = ?orientation,
            "Placed colorbar"
        );
        self.colorbar = Some(placement);
        Ok(placement)
    }

    /// The finished raster, with gridlines and the colorbar on top when enabled
    pub fn image(&self) -> Result<RgbaImage> {
        let mut img = self.canvas.clone();
        if self.options.gridlines {
            self.draw_gridlines(&mut img)?;
        }
        if let Some(placement) = self.colorbar {
            self.draw_colorbar(&mut img, placement)?;
        }
        Ok(img)
    }

    fn draw_gridlines(&self, img: &mut RgbaImage) -> Result<()> {
        let (lat_ticks, lon_ticks) = self.ticks()?;
        let stroke = Stroke::dashed(GRIDLINE, 1, 4, 4);
        let (w, h) = ((self.options.width - 1) as f64, (self.options.height - 1) as f64);

        for lat in lat_ticks {
            let (_, y) = self.project(self.extent.west, lat);
            if (0.0..=h).contains(&y) {
                draw_line(img, (0.0, y), (w, y), &stroke);
                if self.options.tick_labels {
                    let text = format_degrees(lat, 'N', 'S');
                    draw_text(img, &text, (2.0, y), (Align::Start, Align::Center), LABEL_SIZE, BLACK)?;
                }
            }
        }
        for lon in lon_ticks {
            let (x, _) = self.project(lon, self.extent.north);
            if (0.0..=w).contains(&x) {
                draw_line(img, (x, 0.0), (x, h), &stroke);
                if self.options.tick_labels {
                    let text = format_degrees(lon, 'E', 'W');
                    draw_text(img, &text, (x, h - 1.0), (Align::Center, Align::End), LABEL_SIZE, BLACK)?;
                }
            }
        }
        Ok(())
    }

    fn draw_colorbar(&self, img: &mut RgbaImage, placement: ColorbarPlacement) -> Result<()> {
        let Some(layer) = self.layer.as_ref() else {
            return Ok(());
        };
        let (length, thickness) = match placement.orientation {
            Orientation::Horizontal => (placement.width, placement.height),
            Orientation::Vertical => (placement.height, placement.width),
        };
        let strip = self.colorbar(length, thickness, placement.orientation)?;
        let (x, y) = (placement.x as f64, placement.y as f64);
        let (w, h) = (placement.width as f64, placement.height as f64);

        imageops::replace(img, &strip, placement.x as i64, placement.y as i64);
        draw_hollow_rect_mut(
            img,
            Rect::at(placement.x as i32 - 1, placement.y as i32 - 1)
                .of_size(placement.width + 2, placement.height + 2),
            Rgba(BLACK),
        );

        let (low, high) = (format_value(layer.vmin), format_value(layer.vmax));
        match placement.orientation {
            Orientation::Horizontal => {
                draw_text(img, &low, (x, y + h + 2.0), (Align::Start, Align::Start), LABEL_SIZE, BLACK)?;
                draw_text(img, &high, (x + w, y + h + 2.0), (Align::End, Align::Start), LABEL_SIZE, BLACK)?;
            }
            Orientation::Vertical => {
                draw_text(img, &low, (x + w + 3.0, y + h), (Align::Start, Align::End), LABEL_SIZE, BLACK)?;
                draw_text(img, &high, (x + w + 3.0, y), (Align::Start, Align::Start), LABEL_SIZE, BLACK)?;
            }
        }
        draw_text(
            img,
            &layer.label,
            (x + w / 2.0, y - 3.0),
            (Align::Center, Align::End),
            LABEL_SIZE,
            BLACK,
        )
    }

    /// Encode the finished map
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let img = self.image()?;
        let mut buffer = Cursor::new(Vec::new());

        match format {
            OutputFormat::Png => {
                img.write_to(&mut buffer, image::ImageFormat::Png)
                    .map_err(|e| GenMapError::ImageGeneration {
                        message: format!("Failed to encode PNG: {}", e),
                    })?;
            }
            OutputFormat::Jpeg => {
                DynamicImage::ImageRgba8(img)
                    .to_rgb8()
                    .write_to(&mut buffer, image::ImageFormat::Jpeg)
                    .map_err(|e| GenMapError::ImageGeneration {
                        message: format!("Failed to encode JPEG: {}", e),
                    })?;
            }
        }

        Ok(buffer.into_inner())
    }

    /// Encode and write the map, choosing the format from the file extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = OutputFormat::from_path(path)?;
        let bytes = self.encode(format)?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved map");
        Ok(())
    }

    fn on_canvas(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x <= (self.options.width - 1) as f64 && y <= (self.options.height - 1) as f64
    }
}

/// Limits for a field without a single usable value
fn placeholder_limits(normalization: Normalization) -> (f32, f32) {
    match normalization {
        Normalization::Logarithmic => (1.0, 10.0),
        Normalization::Linear => (0.0, 1.0),
        Normalization::DivergingCentered => (-1.0, 1.0),
    }
}

/// Degree label such as `25°S` or `47.5°W`
fn format_degrees(value: f64, positive: char, negative: char) -> String {
    let magnitude = (value.abs() * 100.0).round() / 100.0;
    if magnitude == 0.0 {
        return "0°".to_string();
    }
    let hemisphere = if value > 0.0 { positive } else { negative };
    format!("{}°{}", magnitude, hemisphere)
}

/// Colorbar limit with at most three decimals and no trailing zeros
fn format_value(value: f32) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaletteConfig;
    use crate::presets::Capabilities;
    use ndarray::Array2;

    fn setup() -> (ColormapRegistry, PresetResolver) {
        let registry = ColormapRegistry::with_defaults(&PaletteConfig::default()).unwrap();
        (registry, PresetResolver::new(Capabilities::default()))
    }

    fn small_options() -> MapOptions {
        MapOptions {
            width: 40,
            height: 20,
            gridlines: false,
            ..Default::default()
        }
    }

    fn extent() -> Extent {
        Extent::new(10.0, 0.0, 20.0, 0.0).unwrap()
    }

    fn ramp_grid() -> Grid {
        let lat: Vec<f64> = (0..=10).map(f64::from).collect();
        let lon: Vec<f64> = (0..=20).map(f64::from).collect();
        let values = Array2::from_shape_fn((11, 21), |(_, j)| j as f32);
        Grid::new(lat, lon, values).unwrap()
    }

    #[test]
    fn test_project_roundtrip_corners() {
        let (registry, resolver) = setup();
        let map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        assert_eq!(map.project(0.0, 10.0), (0.0, 0.0));
        assert_eq!(map.project(20.0, 0.0), (39.0, 19.0));
        assert_eq!(map.unproject(39.0, 19.0), (20.0, 0.0));
    }

    #[test]
    fn test_render_sst_uses_preset() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        let preset = map.render_field("sst", &ramp_grid(), Limits::default()).unwrap();

        assert_eq!(preset.colormap, "genmap_sst");
        assert_eq!(map.limits(), Some((0.0, 20.0)));
        assert_eq!(map.label(), Some("Sea Surface Temperature (°C)"));

        let sst = registry.resolve("genmap_sst").unwrap();
        let img = map.image().unwrap();
        assert_eq!(img.get_pixel(0, 10).0, sst.map_normalized(0.0));
        assert_eq!(img.get_pixel(39, 10).0, sst.map_normalized(1.0));
    }

    #[test]
    fn test_render_unknown_field() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        let err = map
            .render_field("salinity", &ramp_grid(), Limits::default())
            .unwrap_err();
        assert!(matches!(err, GenMapError::UnknownField { .. }));
        assert!(map.label().is_none());
    }

    #[test]
    fn test_log_field_rejects_non_positive_limits() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        assert!(map
            .render_field("chl", &ramp_grid(), Limits::new(0.0, 10.0))
            .is_err());
        // Auto limits skip the zero column
        assert!(map.render_field("chl", &ramp_grid(), Limits::default()).is_ok());
        assert_eq!(map.limits(), Some((1.0, 20.0)));
    }

    #[test]
    fn test_missing_values_use_palette_nan_color() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        let grid = Grid::new(
            vec![0.0, 10.0],
            vec![0.0, 20.0],
            Array2::from_elem((2, 2), f32::NAN),
        )
        .unwrap();
        map.render_field("sst", &grid, Limits::new(0.0, 30.0)).unwrap();

        let img = map.image().unwrap();
        // genmap_sst declares N 200 200 200
        assert_eq!(img.get_pixel(5, 5).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_field_without_usable_values_is_masked() {
        let (registry, resolver) = setup();
        let nan_grid = Grid::new(
            vec![0.0, 10.0],
            vec![0.0, 20.0],
            Array2::from_elem((2, 2), f32::NAN),
        )
        .unwrap();
        let negative_grid = Grid::new(
            vec![0.0, 10.0],
            vec![0.0, 20.0],
            Array2::from_elem((2, 2), -3.0),
        )
        .unwrap();

        for (field, grid) in [("chl", &nan_grid), ("chl", &negative_grid), ("sst", &nan_grid)] {
            let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
            map.render_field(field, grid, Limits::default()).unwrap();

            let preset = resolver.get_preset(field).unwrap();
            let cmap = registry.resolve(&preset.colormap).unwrap();
            let expected = cmap
                .bad_color()
                .map(|c| rgba8(&c))
                .unwrap_or([255, 255, 255, 255]);
            let img = map.image().unwrap();
            assert!(img.pixels().all(|p| p.0 == expected), "{} left unmasked pixels", field);
        }
    }

    #[test]
    fn test_contourf_levels() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        map.contourf(&ramp_grid(), "viridis", Normalization::Linear, Limits::default(), Some(4))
            .unwrap();

        let img = map.image().unwrap();
        let mut row: Vec<[u8; 4]> = (0..40).map(|x| img.get_pixel(x, 10).0).collect();
        row.dedup();
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_quiver_and_overlay_dispatch() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        let vectors = VectorGrid::new(
            vec![2.0, 8.0],
            vec![5.0, 15.0],
            Array2::from_elem((2, 2), 5.0),
            Array2::from_elem((2, 2), 0.0),
        )
        .unwrap();

        let wind = resolver.get_preset("wind").unwrap();
        assert_eq!(map.render_overlay(&wind, &vectors).unwrap(), 4);

        let sst = resolver.get_preset("sst").unwrap();
        assert_eq!(map.render_overlay(&sst, &vectors).unwrap(), 0);

        assert!(map
            .quiver(&vectors, QuiverOptions { step: 0, scale: 25.0 })
            .is_err());
    }

    #[test]
    fn test_quiver_with_fill_value_vectors() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        // NetCDF default fill value left in the eastward component
        let vectors = VectorGrid::new(
            vec![2.0, 8.0],
            vec![5.0, 15.0],
            Array2::from_elem((2, 2), 9.96921e36),
            Array2::from_elem((2, 2), 0.0),
        )
        .unwrap();

        assert_eq!(map.quiver(&vectors, QuiverOptions::default()).unwrap(), 4);
        let (x, y) = map.project(5.0, 2.0);
        assert_eq!(map.canvas.get_pixel(x.round() as u32 + 1, y.round() as u32).0, BLACK);
    }

    #[test]
    fn test_far_off_canvas_geometry() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();

        let bar = map.add_scalebar(1e30, (0.5, 0.5)).unwrap();
        assert!(bar.lon_right - bar.lon_left > 1e27);

        let far = vec![(-1e200, 5.0), (1e200, 5.0), (10.0, -1e300)];
        assert_eq!(map.add_coastlines(&[far]), 1);
        assert!(map.image().is_ok());
    }

    #[test]
    fn test_streamlines() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        let vectors = VectorGrid::new(
            vec![0.0, 10.0],
            vec![0.0, 20.0],
            Array2::from_elem((2, 2), 1.0),
            Array2::from_elem((2, 2), 0.0),
        )
        .unwrap();
        let options = StreamlineOptions {
            spacing: 10,
            ..Default::default()
        };
        let drawn = map.streamlines(&vectors, options).unwrap();
        assert_eq!(drawn, 8);
    }

    #[test]
    fn test_scalebar_at_equator() {
        let (registry, resolver) = setup();
        let extent = Extent::new(1.0, -1.0, 10.0, 0.0).unwrap();
        let mut map = GenMap::new(extent, small_options(), &registry, &resolver).unwrap();
        let bar = map.add_scalebar(111.195, (0.5, 0.05)).unwrap();

        assert!((bar.lon_right - bar.lon_left - 1.0).abs() < 1e-3);
        assert!((bar.lon_left + bar.lon_right - 10.0).abs() < 1e-9);
        assert_eq!(bar.label, "111.195 km");
        assert!(map.add_scalebar(-1.0, (0.5, 0.05)).is_err());
    }

    #[test]
    fn test_gridlines_drawn_on_output_only() {
        let (registry, resolver) = setup();
        let options = MapOptions {
            width: 21,
            height: 11,
            tick_step: (5.0, 5.0),
            ..Default::default()
        };
        let map = GenMap::new(extent(), options, &registry, &resolver).unwrap();
        let (lat_ticks, lon_ticks) = map.ticks().unwrap();
        assert_eq!(lat_ticks, vec![0.0, 5.0, 10.0]);
        assert_eq!(lon_ticks, vec![0.0, 5.0, 10.0, 15.0, 20.0]);

        let img = map.image().unwrap();
        assert_ne!(img.get_pixel(5, 1).0, [255, 255, 255, 255]);
        assert_eq!(map.canvas.get_pixel(5, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_colorbar() {
        let (registry, resolver) = setup();
        let mut map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        assert!(map.colorbar(100, 10, Orientation::Horizontal).is_err());

        map.render_field("wind", &ramp_grid(), Limits::default()).unwrap();
        let plasma = registry.resolve("plasma").unwrap();
        let bar = map.colorbar(100, 10, Orientation::Vertical).unwrap();
        assert_eq!(bar.dimensions(), (10, 100));
        assert_eq!(bar.get_pixel(0, 0).0, plasma.map_normalized(1.0));
        assert_eq!(bar.get_pixel(0, 99).0, plasma.map_normalized(0.0));
    }

    #[test]
    fn test_colorbar_placed_by_coords() {
        let (registry, resolver) = setup();
        let options = MapOptions {
            width: 201,
            height: 101,
            ..small_options()
        };
        let mut map = GenMap::new(extent(), options, &registry, &resolver).unwrap();
        assert!(map
            .add_colorbar_by_coords(2.0, 4.0, 18.0, 6.0, Orientation::Horizontal)
            .is_err());

        map.render_field("wind", &ramp_grid(), Limits::default()).unwrap();
        let placement = map
            .add_colorbar_by_coords(2.0, 4.0, 18.0, 6.0, Orientation::Horizontal)
            .unwrap();
        assert_eq!(
            placement,
            ColorbarPlacement {
                x: 20,
                y: 40,
                width: 161,
                height: 21,
                orientation: Orientation::Horizontal,
            }
        );

        let plasma = registry.resolve("plasma").unwrap();
        let img = map.image().unwrap();
        assert_eq!(img.get_pixel(21, 50).0, plasma.map_normalized(1.0 / 160.0));
        assert_eq!(img.get_pixel(180, 50).0, plasma.map_normalized(1.0));
        // Frame just outside the strip
        assert_eq!(img.get_pixel(100, 39).0, BLACK);
        // Canvas keeps the field underneath
        assert_ne!(map.canvas.get_pixel(21, 50).0, img.get_pixel(21, 50).0);

        assert!(map
            .add_colorbar_by_coords(30.0, 4.0, 40.0, 6.0, Orientation::Horizontal)
            .is_err());
        assert!(map
            .add_colorbar_by_coords(2.0, 4.0, f64::NAN, 6.0, Orientation::Vertical)
            .is_err());
    }

    #[test]
    fn test_label_formatting() {
        assert_eq!(format_degrees(-25.0, 'N', 'S'), "25°S");
        assert_eq!(format_degrees(47.5, 'E', 'W'), "47.5°E");
        assert_eq!(format_degrees(0.0, 'E', 'W'), "0°");
        assert_eq!(format_value(20.0), "20");
        assert_eq!(format_value(0.125), "0.125");
        assert_eq!(format_value(-0.0001), "0");
    }

    #[test]
    fn test_tick_labels_drawn_with_gridlines() {
        let (registry, resolver) = setup();
        let options = MapOptions {
            width: 200,
            height: 100,
            tick_step: (5.0, 5.0),
            ..Default::default()
        };
        let labelled = GenMap::new(extent(), options.clone(), &registry, &resolver).unwrap();
        let plain = GenMap::new(
            extent(),
            MapOptions {
                tick_labels: false,
                ..options
            },
            &registry,
            &resolver,
        )
        .unwrap();

        // Gridlines alone are translucent, text is drawn in solid black
        let count_dark = |img: &RgbaImage| img.pixels().filter(|p| p.0[0] < 100).count();
        assert_eq!(count_dark(&plain.image().unwrap()), 0);
        assert!(count_dark(&labelled.image().unwrap()) > 0);
    }

    #[test]
    fn test_excessive_tick_count_rejected() {
        let (registry, resolver) = setup();
        let options = MapOptions {
            tick_step: (1e-12, 1e-12),
            ..small_options()
        };
        let err = GenMap::new(extent(), options, &registry, &resolver).err().unwrap();
        assert!(matches!(err, GenMapError::InvalidParameter { .. }));
    }

    #[test]
    fn test_encode_formats() {
        let (registry, resolver) = setup();
        let map = GenMap::new(extent(), small_options(), &registry, &resolver).unwrap();
        let png = map.encode(OutputFormat::Png).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
        let jpeg = map.encode(OutputFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);

        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_invalid_options() {
        let (registry, resolver) = setup();
        let options = MapOptions {
            resampling: "cubic".to_string(),
            ..small_options()
        };
        assert!(GenMap::new(extent(), options, &registry, &resolver).is_err());

        let options = MapOptions {
            width: 1,
            ..small_options()
        };
        assert!(GenMap::new(extent(), options, &registry, &resolver).is_err());
    }
}
