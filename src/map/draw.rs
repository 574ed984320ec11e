//! Drawing helpers over `imageproc`.
//!
//! Segments are clipped to the canvas in floating point before they reach the
//! rasterizer, so arbitrarily distant endpoints cost no more than on-canvas ones.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut, Blend, Canvas};
use once_cell::sync::Lazy;
use rusttype::{point, Font, Scale};

use crate::error::{GenMapError, Result};

const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

static FONT: Lazy<Option<Font<'static>>> = Lazy::new(|| Font::try_from_bytes(FONT_DATA));

fn font() -> Result<&'static Font<'static>> {
    FONT.as_ref().ok_or_else(|| GenMapError::ImageGeneration {
        message: "embedded label font could not be loaded".to_string(),
    })
}

/// Line style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: [u8; 4],
    pub width: u32,
    /// `(on, off)` lengths in pixels
    pub dash: Option<(u32, u32)>,
}

impl Stroke {
    pub fn solid(color: [u8; 4], width: u32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: [u8; 4], width: u32, on: u32, off: u32) -> Self {
        Self {
            color,
            width,
            dash: Some((on, off)),
        }
    }
}

/// Horizontal or vertical placement of text relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
}

/// Clip a segment to the pixel rectangle `[0, width-1] x [0, height-1]`
/// (Liang-Barsky). Returns `None` when nothing of it is visible.
pub fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    width: u32,
    height: u32,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if ![from.0, from.1, dx, dy].iter().all(|v| v.is_finite()) || width == 0 || height == 0 {
        return None;
    }

    let x_max = (width - 1) as f64;
    let y_max = (height - 1) as f64;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, from.0),
        (dx, x_max - from.0),
        (-dy, from.1),
        (dy, y_max - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

fn to_pixel(p: (f64, f64)) -> (f32, f32) {
    (p.0.round() as f32, p.1.round() as f32)
}

fn draw_clipped<C>(canvas: &mut C, from: (f64, f64), to: (f64, f64), stroke: &Stroke)
where
    C: Canvas<Pixel = Rgba<u8>>,
{
    let (width, height) = canvas.dimensions();
    let Some((a, b)) = clip_segment(from, to, width, height) else {
        return;
    };
    let color = Rgba(stroke.color);

    match stroke.dash {
        Some((on, off)) if on > 0 && on + off > 0 => {
            // Pixel steps of the rasterized segment
            let length = (b.0 - a.0).abs().max((b.1 - a.1).abs());
            let at = |s: f64| {
                if length == 0.0 {
                    a
                } else {
                    (a.0 + (b.0 - a.0) * s / length, a.1 + (b.1 - a.1) * s / length)
                }
            };
            let mut s = 0.0;
            while s <= length {
                let end = (s + (on - 1) as f64).min(length);
                draw_line_segment_mut(canvas, to_pixel(at(s)), to_pixel(at(end)), color);
                s += (on + off) as f64;
            }
        }
        _ => draw_line_segment_mut(canvas, to_pixel(a), to_pixel(b), color),
    }
}

/// Draw a straight line between two pixel positions, alpha-blended onto `img`
pub fn draw_line(img: &mut RgbaImage, from: (f64, f64), to: (f64, f64), stroke: &Stroke) {
    let mut canvas = Blend(std::mem::take(img));
    stroke_segment(&mut canvas, from, to, stroke);
    *img = canvas.0;
}

fn stroke_segment<C>(canvas: &mut C, from: (f64, f64), to: (f64, f64), stroke: &Stroke)
where
    C: Canvas<Pixel = Rgba<u8>>,
{
    let width = stroke.width.max(1) as i64;
    // Thickness goes across the dominant direction of travel
    let horizontal = (to.0 - from.0).abs() >= (to.1 - from.1).abs();
    for offset in -(width / 2)..=(width - 1) / 2 {
        let o = offset as f64;
        let (a, b) = if horizontal {
            ((from.0, from.1 + o), (to.0, to.1 + o))
        } else {
            ((from.0 + o, from.1), (to.0 + o, to.1))
        };
        draw_clipped(canvas, a, b, stroke);
    }
}

/// Draw connected line segments
pub fn draw_polyline(img: &mut RgbaImage, points: &[(f64, f64)], stroke: &Stroke) {
    let mut canvas = Blend(std::mem::take(img));
    for pair in points.windows(2) {
        stroke_segment(&mut canvas, pair[0], pair[1], stroke);
    }
    *img = canvas.0;
}

/// Draw a line with an open arrowhead at `to`
pub fn draw_arrow(img: &mut RgbaImage, from: (f64, f64), to: (f64, f64), stroke: &Stroke) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);

    let mut canvas = Blend(std::mem::take(img));
    stroke_segment(&mut canvas, from, to, stroke);
    if length.is_finite() && length >= 1.0 {
        let head = (length * 0.3).clamp(2.0, 8.0);
        let angle = dy.atan2(dx);
        for side in [-1.0, 1.0] {
            let a = angle + std::f64::consts::PI + side * 0.44;
            let barb = (to.0 + head * a.cos(), to.1 + head * a.sin());
            stroke_segment(&mut canvas, to, barb, stroke);
        }
    }
    *img = canvas.0;
}

/// Pixel width and height of `text` at `size`
pub fn text_size(text: &str, size: f32) -> Result<(u32, u32)> {
    let font = font()?;
    let scale = Scale::uniform(size);
    let metrics = font.v_metrics(scale);
    let width = font
        .layout(text, scale, point(0.0, metrics.ascent))
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .map(|bb| bb.max.x)
        .max()
        .unwrap_or(0);
    Ok((width.max(0) as u32, (metrics.ascent - metrics.descent).ceil() as u32))
}

/// Draw `text` aligned on `anchor`, shifted as needed to stay on the canvas
pub fn draw_text(
    img: &mut RgbaImage,
    text: &str,
    anchor: (f64, f64),
    align: (Align, Align),
    size: f32,
    color: [u8; 4],
) -> Result<()> {
    if text.is_empty() || !(anchor.0.is_finite() && anchor.1.is_finite()) {
        return Ok(());
    }

    let (w, h) = text_size(text, size)?;
    let place = |anchor: f64, extent: u32, align: Align, limit: u32| -> i32 {
        let start = match align {
            Align::Start => anchor,
            Align::Center => anchor - extent as f64 / 2.0,
            Align::End => anchor - extent as f64,
        };
        let max_start = limit.saturating_sub(extent) as f64;
        start.clamp(0.0, max_start).round() as i32
    };
    let x = place(anchor.0, w, align.0, img.width());
    let y = place(anchor.1, h, align.1, img.height());

    draw_text_mut(img, Rgba(color), x, y, Scale::uniform(size), font()?, text);
    Ok(())
}
