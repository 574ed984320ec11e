//! Colormaps available without any palette file on disk.
//!
//! The matplotlib-style sequential and diverging maps come from `colorgrad`
//! and are sampled into palettes so they behave exactly like parsed ones.
//! The GenMap palettes are compiled into the binary.

use colorgrad::{Color, Gradient};

use super::cpt::parse_palette;
use super::palette::PaletteDefinition;
use crate::error::Result;

/// Number of samples taken from a library gradient
pub const LIBRARY_SAMPLES: usize = 256;

/// Palettes shipped with genmap, registered under these names
pub const BUNDLED_PALETTES: &[(&str, &str)] = &[
    ("genmap_sst", include_str!("../../palettes/sst.cpt")),
    ("genmap_rainbow", include_str!("../../palettes/rainbow.cpt")),
];

/// Palettes standing in for the companion ocean palette collection
pub const COMPANION_PALETTES: &[(&str, &str)] =
    &[("cmo.speed", include_str!("../../palettes/cmo_speed.cpt"))];

/// Coolwarm diverging map, blue to red through light grey
const COOLWARM: [[u8; 3]; 17] = [
    [59, 76, 192],
    [77, 104, 215],
    [98, 130, 234],
    [119, 154, 247],
    [141, 176, 254],
    [163, 194, 255],
    [184, 208, 249],
    [204, 217, 238],
    [221, 221, 221],
    [236, 211, 197],
    [245, 196, 173],
    [247, 177, 148],
    [244, 154, 123],
    [236, 127, 99],
    [222, 96, 77],
    [203, 62, 56],
    [180, 4, 38],
];

fn sample(gradient: Gradient) -> Result<PaletteDefinition> {
    PaletteDefinition::from_colors(gradient.colors(LIBRARY_SAMPLES))
}

/// All library colormaps as `(name, definition)` pairs
pub fn library_palettes() -> Result<Vec<(String, PaletteDefinition)>> {
    let rd_bu = sample(colorgrad::rd_bu())?;
    let coolwarm = PaletteDefinition::from_colors(
        COOLWARM
            .iter()
            .map(|[r, g, b]| Color::from_rgba8(*r, *g, *b, 255))
            .collect(),
    )?;

    Ok(vec![
        ("viridis".to_string(), sample(colorgrad::viridis())?),
        ("plasma".to_string(), sample(colorgrad::plasma())?),
        ("inferno".to_string(), sample(colorgrad::inferno())?),
        ("magma".to_string(), sample(colorgrad::magma())?),
        ("cividis".to_string(), sample(colorgrad::cividis())?),
        ("turbo".to_string(), sample(colorgrad::turbo())?),
        ("RdBu_r".to_string(), rd_bu.reversed()),
        ("RdBu".to_string(), rd_bu),
        ("coolwarm_r".to_string(), coolwarm.reversed()),
        ("coolwarm".to_string(), coolwarm),
    ])
}

/// Parse an embedded `(name, source)` table
pub fn parse_embedded(table: &[(&str, &str)]) -> Result<Vec<(String, PaletteDefinition)>> {
    table
        .iter()
        .map(|(name, source)| Ok((name.to_string(), parse_palette(source)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormaps::colormap::rgba8;

    #[test]
    fn test_bundled_palettes_parse() {
        let bundled = parse_embedded(BUNDLED_PALETTES).unwrap();
        assert_eq!(bundled.len(), 2);

        let (name, sst) = &bundled[0];
        assert_eq!(name, "genmap_sst");
        assert_eq!(sst.min(), -2.0);
        assert_eq!(sst.max(), 34.0);
        assert!(sst.nan_color().is_some());

        let companion = parse_embedded(COMPANION_PALETTES).unwrap();
        assert_eq!(companion[0].0, "cmo.speed");
    }

    #[test]
    fn test_library_palettes() {
        let library = library_palettes().unwrap();
        let names: Vec<&str> = library.iter().map(|(n, _)| n.as_str()).collect();
        for expected in ["viridis", "plasma", "RdBu", "RdBu_r", "coolwarm", "coolwarm_r"] {
            assert!(names.contains(&expected), "missing {}", expected);
        }

        let viridis = &library[0].1;
        assert_eq!(viridis.points().len(), LIBRARY_SAMPLES);
        assert_eq!(viridis.min(), 0.0);
        assert_eq!(viridis.max(), 1.0);
    }

    #[test]
    fn test_reversed_rd_bu_starts_blue() {
        let library = library_palettes().unwrap();
        let (_, rd_bu_r) = library.iter().find(|(n, _)| n == "RdBu_r").unwrap();
        let first = rgba8(&rd_bu_r.points()[0].color);
        let last = rgba8(&rd_bu_r.points()[LIBRARY_SAMPLES - 1].color);
        assert!(first[2] > first[0]);
        assert!(last[0] > last[2]);
    }
}
