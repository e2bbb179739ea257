//! INI serialization: `ConfigFile` → commented `config.ini` text.

use std::fmt::Write;
use std::path::Path;

use super::file::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let index = &config.index;

    let mut layers = String::new();
    for (name, range) in &index.layers {
        // writing to a String cannot fail
        let _ = writeln!(layers, "{} = {}-{}", name, range.minzoom, range.maxzoom);
    }

    format!(
        r#"[index]
; Tiling scheme:
;   s2 - six cube faces, tiles addressed by S2 cell id (default)
;   wm - single-face Web Mercator, tiles addressed by zoom/x/y
projection = {}
; Shallowest and deepest zoom served (maxzoom at most 24)
minzoom = {}
maxzoom = {}
; Eager build depth; deeper tiles are split on first request
index_maxzoom = {}
; Tiles with at most this many vertices stop the eager build early
index_max_points = {}
; Simplification tolerance in output units (0 keeps every vertex)
tolerance = {}
; Output grid size per tile
extent = {}
; Clip buffer around each tile as a fraction of its width (default: 64/8192)
buffer = {}
; Feature property that selects the output layer
layer_property = {}

[layers]
; Zoom range per layer as name = minzoom-maxzoom. Layers not listed are
; emitted at every zoom. A [layer.<name>] section with minzoom/maxzoom keys
; is accepted as well.
{}
[logging]
; Log file location; the file is truncated at the start of every run
directory = {}
file = {}
"#,
        index.projection,
        index.minzoom,
        index.maxzoom,
        index.index_maxzoom,
        index.index_max_points,
        index.tolerance,
        index.extent,
        index.buffer,
        index.layer_property,
        layers,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_string_has_all_sections() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("[index]"));
        assert!(content.contains("[layers]"));
        assert!(content.contains("[logging]"));
        assert!(content.contains("projection = s2"));
        assert!(content.contains("buffer = 0.0078125"));
        assert!(content.contains("layer_property = __layer"));
    }

    #[test]
    fn test_layers_are_listed_by_name() {
        let mut config = ConfigFile::default();
        config.index = config.index.with_layer("roads", 4, 12).with_layer("labels", 8, 14);
        let content = to_config_string(&config);
        let labels = content.find("labels = 8-14").unwrap();
        let roads = content.find("roads = 4-12").unwrap();
        assert!(labels < roads);
    }

    #[test]
    fn test_home_paths_are_abbreviated() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("logs")), "~/logs");
        }
        assert_eq!(path_to_string(Path::new("logs")), "logs");
    }
}
