//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigFile, ConfigFileError};
use crate::cell::Projection;
use crate::index::LayerZoomRange;

/// Prefix of per-layer sections, e.g. `[layer.roads]`.
const LAYER_SECTION_PREFIX: &str = "layer.";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [index] section
    if let Some(section) = ini.section(Some("index")) {
        let index = &mut config.index;
        if let Some(v) = section.get("projection") {
            index.projection = Projection::from_str(v).map_err(|reason| invalid("index", "projection", v, &reason))?;
        }
        if let Some(v) = section.get("minzoom") {
            index.minzoom = parse_number("index", "minzoom", v, "must be an integer between 0 and 24")?;
        }
        if let Some(v) = section.get("maxzoom") {
            index.maxzoom = parse_number("index", "maxzoom", v, "must be an integer between 0 and 24")?;
        }
        if let Some(v) = section.get("index_maxzoom") {
            index.index_maxzoom = parse_number("index", "index_maxzoom", v, "must be an integer between 0 and 24")?;
        }
        if let Some(v) = section.get("index_max_points") {
            index.index_max_points = parse_number("index", "index_max_points", v, "must be a non-negative integer")?;
        }
        if let Some(v) = section.get("tolerance") {
            index.tolerance = parse_number("index", "tolerance", v, "must be a number (output units)")?;
        }
        if let Some(v) = section.get("extent") {
            index.extent = parse_number("index", "extent", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("buffer") {
            index.buffer = parse_number("index", "buffer", v, "must be a fraction of the tile width, e.g. 0.0078125")?;
        }
        if let Some(v) = section.get("layer_property") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("index", "layer_property", v, "must not be empty"));
            }
            index.layer_property = v.to_string();
        }
    }

    // [layers] section: `name = minzoom-maxzoom`
    if let Some(section) = ini.section(Some("layers")) {
        for (name, v) in section.iter() {
            let range = parse_zoom_range(v).ok_or_else(|| invalid("layers", name, v, "expected a range like '4-12'"))?;
            config.index.layers.insert(name.to_string(), range);
        }
    }

    // [layer.<name>] sections
    for (name, section) in ini.iter() {
        let Some(layer) = name.and_then(|n| n.strip_prefix(LAYER_SECTION_PREFIX)) else {
            continue;
        };
        let section_name = format!("{}{}", LAYER_SECTION_PREFIX, layer);
        let mut range = config
            .index
            .layers
            .get(layer)
            .copied()
            .unwrap_or_else(|| LayerZoomRange::new(config.index.minzoom, config.index.maxzoom));
        if let Some(v) = section.get("minzoom") {
            range.minzoom = parse_number(&section_name, "minzoom", v, "must be an integer between 0 and 24")?;
        }
        if let Some(v) = section.get("maxzoom") {
            range.maxzoom = parse_number(&section_name, "maxzoom", v, "must be an integer between 0 and 24")?;
        }
        config.index.layers.insert(layer.to_string(), range);
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value.trim().parse().map_err(|_| invalid(section, key, value, reason))
}

/// Parses `"4-12"` into an inclusive zoom range.
fn parse_zoom_range(value: &str) -> Option<LayerZoomRange> {
    let (min, max) = value.split_once('-')?;
    let minzoom = min.trim().parse().ok()?;
    let maxzoom = max.trim().parse().ok()?;
    Some(LayerZoomRange::new(minzoom, maxzoom))
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TileIndexConfig;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        ConfigFile::from_ini_str(content)
    }

    #[test]
    fn test_partial_config() {
        let config = parse(
            r#"
[index]
maxzoom = 12
tolerance = 0.5
"#,
        )
        .unwrap();

        assert_eq!(config.index.maxzoom, 12);
        assert_eq!(config.index.tolerance, 0.5);
        // untouched values keep their defaults
        assert_eq!(config.index.extent, TileIndexConfig::default().extent);
        assert_eq!(config.index.projection, Projection::S2);
    }

    #[test]
    fn test_projection_names() {
        let config = parse("[index]\nprojection = WM\n").unwrap();
        assert_eq!(config.index.projection, Projection::WebMercator);

        let err = parse("[index]\nprojection = mercator\n").unwrap_err();
        assert!(err.to_string().contains("index.projection"));
        assert!(err.to_string().contains("expected 's2' or 'wm'"));
    }

    #[test]
    fn test_invalid_number() {
        let err = parse("[index]\nextent = big\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, value, .. } => {
                assert_eq!(section, "index");
                assert_eq!(key, "extent");
                assert_eq!(value, "big");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_layer_property() {
        let err = parse("[index]\nlayer_property = \n").unwrap_err();
        assert!(err.to_string().contains("layer_property"));
    }

    #[test]
    fn test_layer_ranges() {
        let config = parse(
            r#"
[layers]
roads = 4-12
labels = 8 - 14

[layer.water]
minzoom = 2

[layer.roads]
maxzoom = 16
"#,
        )
        .unwrap();

        let layers = &config.index.layers;
        assert_eq!(layers["labels"], LayerZoomRange::new(8, 14));
        // the long form overrides the short one key by key
        assert_eq!(layers["roads"], LayerZoomRange::new(4, 16));
        // unspecified bounds fall back to the index range
        assert_eq!(layers["water"], LayerZoomRange::new(2, 20));
    }

    #[test]
    fn test_malformed_layer_range() {
        let err = parse("[layers]\nroads = 12\n").unwrap_err();
        assert!(err.to_string().contains("layers.roads"));
    }

    #[test]
    fn test_inverted_layer_range_fails_validation() {
        let result = parse("[layers]\nroads = 12-4\n");
        assert!(matches!(result, Err(ConfigFileError::Index(_))));
    }

    #[test]
    fn test_logging_section() {
        let config = parse("[logging]\ndirectory = /var/log/s2tiler\nfile = run.log\n").unwrap();
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/s2tiler"));
        assert_eq!(config.logging.file, "run.log");
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/logs/s2tiler");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("logs/s2tiler"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
