//! Named colormap registry.
//!
//! The registry owns every colormap a map can be drawn with. Registration is
//! idempotent per name: the same definition twice is a no-op, a different
//! definition under a taken name is rejected.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::builtin::{library_palettes, parse_embedded, BUNDLED_PALETTES, COMPANION_PALETTES};
use super::colormap::{ColormapHandle, Discretized};
use super::cpt::parse_palette;
use super::palette::{PaletteColormap, PaletteDefinition};
use crate::config::PaletteConfig;
use crate::error::{GenMapError, Result};
use crate::logging::{log_operation_end, log_operation_start};

struct Entry {
    definition: PaletteDefinition,
    handle: ColormapHandle,
}

/// Registry mapping colormap names to immutable handles
#[derive(Default)]
pub struct ColormapRegistry {
    entries: HashMap<String, Entry>,
}

impl ColormapRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the library colormaps, the bundled GenMap
    /// palettes, the companion palettes when enabled and every `*.cpt` file
    /// in the configured extra directory.
    pub fn with_defaults(config: &PaletteConfig) -> Result<Self> {
        let start = Instant::now();
        log_operation_start("registry_init", None);

        let mut registry = Self::new();
        for (name, definition) in library_palettes()? {
            registry.register(&name, definition)?;
        }
        for (name, definition) in parse_embedded(BUNDLED_PALETTES)? {
            registry.register(&name, definition)?;
        }
        if config.companion_palettes {
            for (name, definition) in parse_embedded(COMPANION_PALETTES)? {
                registry.register(&name, definition)?;
            }
        }
        if let Some(dir) = &config.extra_dir {
            registry.load_palette_dir(dir)?;
        }

        info!(
            colormaps = registry.len(),
            companion_palettes = config.companion_palettes,
            "Colormap registry ready"
        );
        log_operation_end("registry_init", start, true);
        Ok(registry)
    }

    /// Register a palette under `name`.
    ///
    /// Fails with [`GenMapError::DuplicateName`] when `name` is already bound
    /// to a different definition.
    pub fn register(&mut self, name: &str, definition: PaletteDefinition) -> Result<()> {
        if name.trim().is_empty() {
            return Err(GenMapError::invalid("name", "colormap name cannot be empty"));
        }

        if let Some(existing) = self.entries.get(name) {
            if existing.definition == definition {
                debug!(colormap = name, "Colormap already registered, skipping");
                return Ok(());
            }
            return Err(GenMapError::DuplicateName {
                name: name.to_string(),
            });
        }

        let handle: ColormapHandle = Arc::new(PaletteColormap::new(name, &definition));
        self.entries
            .insert(name.to_string(), Entry { definition, handle });
        debug!(colormap = name, "Registered colormap");
        Ok(())
    }

    /// Parse palette source text and register it. Nothing is registered if parsing fails.
    pub fn register_source(&mut self, name: &str, source: &str) -> Result<()> {
        let definition = parse_palette(source)?;
        self.register(name, definition)
    }

    /// Read a CPT file from disk and register it under `name`
    pub fn load_palette_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            GenMapError::Io(std::io::Error::new(
                e.kind(),
                format!("CPT file not found or unreadable: {}: {}", path.display(), e),
            ))
        })?;
        self.register_source(name, &source)
    }

    /// Register every `*.cpt` file in `dir` under its file stem.
    ///
    /// Files are processed in name order; the first failure aborts the scan.
    pub fn load_palette_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("cpt") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "Skipping palette with non UTF-8 name");
                continue;
            };
            self.load_palette_file(name, path)?;
        }

        info!(dir = %dir.display(), palettes = paths.len(), "Loaded palette directory");
        Ok(paths.len())
    }

    /// Look up a colormap by name
    pub fn resolve(&self, name: &str) -> Result<ColormapHandle> {
        self.entries
            .get(name)
            .map(|entry| Arc::clone(&entry.handle))
            .ok_or_else(|| GenMapError::UnknownColormap {
                name: name.to_string(),
            })
    }

    /// Look up a colormap and quantize it into `levels` flat bands
    pub fn resolve_discrete(&self, name: &str, levels: usize) -> Result<ColormapHandle> {
        let handle = self.resolve(name)?;
        Ok(Arc::new(Discretized::new(handle, levels)?))
    }

    /// The definition a colormap was registered with
    pub fn definition(&self, name: &str) -> Option<&PaletteDefinition> {
        self.entries.get(name).map(|entry| &entry.definition)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormaps::colormap::rgba8;
    use colorgrad::Color;

    const BLUE_RED: &str = "0 0 0 255 1 255 0 0\n";
    const BLUE_GREEN: &str = "0 0 0 255 1 0 255 0\n";

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ColormapRegistry::new();
        registry.register_source("blue_red", BLUE_RED).unwrap();

        let cmap = registry.resolve("blue_red").unwrap();
        assert_eq!(cmap.name(), "blue_red");
        assert_eq!(cmap.map_normalized(0.0), [0, 0, 255, 255]);
        assert_eq!(cmap.map_normalized(1.0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ColormapRegistry::new();
        registry.register_source("blue_red", BLUE_RED).unwrap();
        let first = registry.resolve("blue_red").unwrap();

        registry.register_source("blue_red", BLUE_RED).unwrap();
        let second = registry.resolve("blue_red").unwrap();

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_conflicting_registration() {
        let mut registry = ColormapRegistry::new();
        registry.register_source("ramp", BLUE_RED).unwrap();

        let err = registry.register_source("ramp", BLUE_GREEN).unwrap_err();
        assert!(matches!(err, GenMapError::DuplicateName { ref name } if name == "ramp"));

        // The first definition is untouched
        let cmap = registry.resolve("ramp").unwrap();
        assert_eq!(cmap.map_normalized(1.0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_malformed_source_registers_nothing() {
        let mut registry = ColormapRegistry::new();
        assert!(registry.register_source("bad", "0 0 0 0\n1 300 0 0\n").is_err());
        assert!(!registry.contains("bad"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_colormap() {
        let registry = ColormapRegistry::new();
        let err = registry.resolve("nope").err().unwrap();
        assert!(matches!(err, GenMapError::UnknownColormap { .. }));
    }

    #[test]
    fn test_with_defaults() {
        let registry = ColormapRegistry::with_defaults(&PaletteConfig::default()).unwrap();
        for name in ["viridis", "plasma", "RdBu_r", "genmap_sst", "genmap_rainbow"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(!registry.contains("cmo.speed"));

        let config = PaletteConfig {
            companion_palettes: true,
            ..Default::default()
        };
        let registry = ColormapRegistry::with_defaults(&config).unwrap();
        assert!(registry.contains("cmo.speed"));
    }

    #[test]
    fn test_nan_color_from_palette() {
        let mut registry = ColormapRegistry::new();
        registry
            .register_source("masked", "0 0 0 0\n1 255 255 255\nN 10 20 30\n")
            .unwrap();
        let cmap = registry.resolve("masked").unwrap();
        assert_eq!(
            cmap.bad_color().as_ref().map(rgba8),
            Some([10, 20, 30, 255])
        );
        assert_eq!(
            registry.definition("masked").unwrap().nan_color(),
            Some(&Color::from_rgba8(10, 20, 30, 255))
        );
    }

    #[test]
    fn test_resolve_discrete() {
        let mut registry = ColormapRegistry::new();
        registry.register_source("grey", "0 0 0 0\n1 255 255 255\n").unwrap();
        let stepped = registry.resolve_discrete("grey", 5).unwrap();

        let mut colors: Vec<[u8; 4]> = (0..50)
            .map(|i| stepped.map_normalized(i as f32 / 49.0))
            .collect();
        colors.dedup();
        assert_eq!(colors.len(), 5);
        assert!(registry.resolve_discrete("grey", 0).is_err());
    }
}
