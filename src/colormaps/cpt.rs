//! CPT palette parsing.
//!
//! Supported records, one per line:
//!
//! - `# ...` comments; a comment mentioning `HSV` switches the color model
//! - `x0 r0 g0 b0 x1 r1 g1 b1 [flags]` segments, both ends become control points
//! - `x r g b` and `x r g b a` single control points
//! - `B`, `F` and `N` records for the background, foreground and missing-value colors
//!
//! Channels may also be written GMT style as `r/g/b`. RGB channels are in
//! `[0, 255]`; HSV uses hue in `[0, 360]` with saturation and value in `[0, 1]`.
//! Alpha, when present, is in `[0, 1]`.

use colorgrad::Color;

use super::palette::{ColorModel, ControlPoint, PaletteDefinition};
use crate::error::{GenMapError, Result};

/// Parse palette source text into a validated definition
pub fn parse_palette(source: &str) -> Result<PaletteDefinition> {
    let mut model = ColorModel::Rgb;
    let mut points: Vec<ControlPoint> = Vec::new();
    let mut background = None;
    let mut foreground = None;
    let mut nan_color = None;

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('#') {
            if line.to_uppercase().contains("HSV") {
                model = ColorModel::Hsv;
            }
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|f| !f.is_empty())
            .collect();

        let Some(&head) = fields.first() else {
            return Err(GenMapError::malformed(line_no, "record has no fields"));
        };

        match head {
            "B" | "F" | "N" => {
                let values = parse_numbers(&fields[1..], line_no)?;
                if values.len() != 3 {
                    return Err(GenMapError::malformed(
                        line_no,
                        format!("{} record needs 3 color channels, found {}", head, values.len()),
                    ));
                }
                let color = to_color(model, &values, 1.0, line_no)?;
                match head {
                    "B" => background = Some(color),
                    "F" => foreground = Some(color),
                    _ => nan_color = Some(color),
                }
            }
            _ if fields.len() >= 8 => {
                let v = parse_numbers(&fields[..8], line_no)?;
                push_point(&mut points, v[0], to_color(model, &v[1..4], 1.0, line_no)?, line_no)?;
                push_point(&mut points, v[4], to_color(model, &v[5..8], 1.0, line_no)?, line_no)?;
            }
            _ if fields.len() == 5 => {
                let v = parse_numbers(&fields, line_no)?;
                if !(0.0..=1.0).contains(&v[4]) {
                    return Err(GenMapError::malformed(
                        line_no,
                        format!("alpha {} outside [0, 1]", v[4]),
                    ));
                }
                push_point(&mut points, v[0], to_color(model, &v[1..4], v[4], line_no)?, line_no)?;
            }
            _ if fields.len() == 4 => {
                let v = parse_numbers(&fields, line_no)?;
                push_point(&mut points, v[0], to_color(model, &v[1..4], 1.0, line_no)?, line_no)?;
            }
            _ => {
                return Err(GenMapError::malformed(
                    line_no,
                    format!("expected 4, 5 or 8 fields, found {}", fields.len()),
                ));
            }
        }
    }

    Ok(PaletteDefinition::new(points)?
        .with_model(model)
        .with_background(background)
        .with_foreground(foreground)
        .with_nan_color(nan_color))
}

fn parse_numbers(fields: &[&str], line_no: usize) -> Result<Vec<f64>> {
    fields
        .iter()
        .map(|field| match field.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(GenMapError::malformed(
                line_no,
                format!("'{}' is not a finite number", field),
            )),
        })
        .collect()
}

fn push_point(
    points: &mut Vec<ControlPoint>,
    position: f64,
    color: Color,
    line_no: usize,
) -> Result<()> {
    if let Some(last) = points.last() {
        if position < last.position {
            return Err(GenMapError::malformed(
                line_no,
                format!(
                    "position {} decreases from previous position {}",
                    position, last.position
                ),
            ));
        }
    }
    points.push(ControlPoint::new(position, color));
    Ok(())
}

fn to_color(model: ColorModel, channels: &[f64], alpha: f64, line_no: usize) -> Result<Color> {
    match model {
        ColorModel::Rgb => {
            if let Some(c) = channels.iter().find(|c| !(0.0..=255.0).contains(*c)) {
                return Err(GenMapError::malformed(
                    line_no,
                    format!("RGB channel {} outside [0, 255]", c),
                ));
            }
            Ok(Color::new(
                channels[0] / 255.0,
                channels[1] / 255.0,
                channels[2] / 255.0,
                alpha,
            ))
        }
        ColorModel::Hsv => {
            let (h, s, v) = (channels[0], channels[1], channels[2]);
            if !(0.0..=360.0).contains(&h) {
                return Err(GenMapError::malformed(
                    line_no,
                    format!("HSV hue {} outside [0, 360]", h),
                ));
            }
            if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&v) {
                return Err(GenMapError::malformed(
                    line_no,
                    format!("HSV saturation/value ({}, {}) outside [0, 1]", s, v),
                ));
            }
            let [r, g, b] = hsv_to_rgb(h, s, v);
            Ok(Color::new(r, g, b, alpha))
        }
    }
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let h = (h % 360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}
