//! Test data generation utilities.
//!
//! Writes palette files and JSON grids into temporary directories.

use serde_json::json;
use std::path::{Path, PathBuf};

/// Three-color palette on a -1..1 scale
pub const TRICOLOR_CPT: &str = "\
# COLOR_MODEL = RGB
-1  0   0   255   0  255 255 255
 0  255 255 255   1  255 0   0
B 0 0 128
F 128 0 0
N 127 127 127
";

/// Palette declared in HSV: hue 240 (blue) to 0 (red)
pub const HSV_CPT: &str = "\
# COLOR_MODEL = HSV
0 240/1/1 1 0/1/1
";

/// Write `contents` to `dir/name`
pub fn write_file(dir: &Path, name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// A sea surface temperature grid warming linearly to the north, with a
/// masked land patch in the south-west corner.
pub fn create_sst_grid(path: &Path) -> std::io::Result<()> {
    let lat: Vec<f64> = (0..=10).map(|i| -30.0 + i as f64).collect();
    let lon: Vec<f64> = (0..=10).map(|i| -50.0 + i as f64).collect();
    let values: Vec<Vec<Option<f64>>> = lat
        .iter()
        .map(|&la| {
            lon.iter()
                .map(|&lo| {
                    if la < -28.0 && lo < -48.0 {
                        None
                    } else {
                        Some(15.0 + (la + 30.0))
                    }
                })
                .collect()
        })
        .collect();

    let grid = json!({ "lat": lat, "lon": lon, "values": values });
    std::fs::write(path, serde_json::to_string(&grid)?)
}

/// A uniform westerly wind on a coarse grid, given only as `u`/`v`
pub fn create_wind_grid(path: &Path) -> std::io::Result<()> {
    let lat: Vec<f64> = (0..5).map(|i| -30.0 + 2.5 * i as f64).collect();
    let lon: Vec<f64> = (0..5).map(|i| -50.0 + 2.5 * i as f64).collect();
    let u = vec![vec![8.0; 5]; 5];
    let v = vec![vec![2.0; 5]; 5];

    let grid = json!({ "lat": lat, "lon": lon, "u": u, "v": v });
    std::fs::write(path, serde_json::to_string(&grid)?)
}
