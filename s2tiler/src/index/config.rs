//! Tile index configuration.
//!
//! `TileIndexConfig` carries every option that shapes the tile pyramid:
//! zoom range, eager build depth, simplification, output extent, clip
//! buffer and layer bucketing.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::cell::Projection;
use crate::geometry::Properties;

/// Shallowest zoom served by default.
pub const DEFAULT_MINZOOM: u8 = 0;

/// Deepest zoom served by default.
pub const DEFAULT_MAXZOOM: u8 = 20;

/// Largest `maxzoom` accepted.
///
/// Tile-local coordinates are computed in `f64` from face-unit coordinates;
/// past zoom 24 the output extent starts to outrun the available precision.
pub const MAX_SUPPORTED_ZOOM: u8 = 24;

/// Depth built eagerly when the index is created.
pub const DEFAULT_INDEX_MAXZOOM: u8 = 4;

/// Tiles with at most this many points stop splitting during the eager build.
pub const DEFAULT_INDEX_MAX_POINTS: usize = 100_000;

/// Simplification tolerance in output units.
pub const DEFAULT_TOLERANCE: f64 = 3.0;

/// Output tile size in integer units.
pub const DEFAULT_EXTENT: u32 = 8192;

/// Clip buffer as a fraction of tile width (64 units of an 8192 extent).
pub const DEFAULT_BUFFER: f64 = 64.0 / 8192.0;

/// Largest accepted clip buffer.
pub const MAX_BUFFER: f64 = 0.5;

/// Property read to pick a feature's layer.
pub const DEFAULT_LAYER_PROPERTY: &str = "__layer";

/// Layer used for features without a layer property.
pub const DEFAULT_LAYER_NAME: &str = "default";

/// Errors raised by [`TileIndexConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("maxzoom {maxzoom} exceeds the supported maximum of {max}")]
    MaxzoomTooLarge { maxzoom: u8, max: u8 },

    #[error("minzoom {minzoom} is greater than maxzoom {maxzoom}")]
    MinzoomAboveMaxzoom { minzoom: u8, maxzoom: u8 },

    #[error("index_maxzoom {index_maxzoom} is greater than maxzoom {maxzoom}")]
    IndexMaxzoomAboveMaxzoom { index_maxzoom: u8, maxzoom: u8 },

    #[error("tolerance must be a finite non-negative number, got {0}")]
    InvalidTolerance(f64),

    #[error("extent must be greater than zero")]
    InvalidExtent,

    #[error("buffer must be within [0, {max}], got {value}")]
    InvalidBuffer { value: f64, max: f64 },

    #[error("layer property name must not be empty")]
    EmptyLayerProperty,

    #[error("layer '{layer}' has minzoom {minzoom} greater than maxzoom {maxzoom}")]
    InvalidLayerRange { layer: String, minzoom: u8, maxzoom: u8 },
}

/// Zooms at which a layer is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerZoomRange {
    pub minzoom: u8,
    pub maxzoom: u8,
}

impl LayerZoomRange {
    pub fn new(minzoom: u8, maxzoom: u8) -> Self {
        Self { minzoom, maxzoom }
    }

    pub fn contains(&self, zoom: u8) -> bool {
        zoom >= self.minzoom && zoom <= self.maxzoom
    }
}

/// Options for building a [`TileIndex`](super::TileIndex).
#[derive(Debug, Clone, PartialEq)]
pub struct TileIndexConfig {
    /// Tiling scheme; decides how tile ids are read.
    pub projection: Projection,

    /// Shallowest zoom `get_tile` serves.
    pub minzoom: u8,

    /// Deepest zoom `get_tile` serves; no tile splits past it.
    pub maxzoom: u8,

    /// Depth of the eager build.
    pub index_maxzoom: u8,

    /// Point budget below which the eager build stops splitting a tile.
    pub index_max_points: usize,

    /// Simplification tolerance in output units.
    pub tolerance: f64,

    /// Output tile size in integer units.
    pub extent: u32,

    /// Clip buffer around each tile, as a fraction of the tile width.
    pub buffer: f64,

    /// Feature property holding the layer name.
    pub layer_property: String,

    /// Per-layer visibility ranges. Layers not listed are visible at every zoom.
    pub layers: BTreeMap<String, LayerZoomRange>,
}

impl Default for TileIndexConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            minzoom: DEFAULT_MINZOOM,
            maxzoom: DEFAULT_MAXZOOM,
            index_maxzoom: DEFAULT_INDEX_MAXZOOM,
            index_max_points: DEFAULT_INDEX_MAX_POINTS,
            tolerance: DEFAULT_TOLERANCE,
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
            layer_property: DEFAULT_LAYER_PROPERTY.to_string(),
            layers: BTreeMap::new(),
        }
    }
}

impl TileIndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_minzoom(mut self, minzoom: u8) -> Self {
        self.minzoom = minzoom;
        self
    }

    pub fn with_maxzoom(mut self, maxzoom: u8) -> Self {
        self.maxzoom = maxzoom;
        self
    }

    pub fn with_index_maxzoom(mut self, index_maxzoom: u8) -> Self {
        self.index_maxzoom = index_maxzoom;
        self
    }

    pub fn with_index_max_points(mut self, index_max_points: usize) -> Self {
        self.index_max_points = index_max_points;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_layer_property(mut self, property: impl Into<String>) -> Self {
        self.layer_property = property.into();
        self
    }

    /// Restricts `layer` to the zooms `minzoom..=maxzoom`.
    pub fn with_layer(mut self, layer: impl Into<String>, minzoom: u8, maxzoom: u8) -> Self {
        self.layers
            .insert(layer.into(), LayerZoomRange::new(minzoom, maxzoom));
        self
    }

    /// Checks every option and their mutual constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maxzoom > MAX_SUPPORTED_ZOOM {
            return Err(ConfigError::MaxzoomTooLarge {
                maxzoom: self.maxzoom,
                max: MAX_SUPPORTED_ZOOM,
            });
        }
        if self.minzoom > self.maxzoom {
            return Err(ConfigError::MinzoomAboveMaxzoom {
                minzoom: self.minzoom,
                maxzoom: self.maxzoom,
            });
        }
        if self.index_maxzoom > self.maxzoom {
            return Err(ConfigError::IndexMaxzoomAboveMaxzoom {
                index_maxzoom: self.index_maxzoom,
                maxzoom: self.maxzoom,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if self.extent == 0 {
            return Err(ConfigError::InvalidExtent);
        }
        if !(0.0..=MAX_BUFFER).contains(&self.buffer) {
            return Err(ConfigError::InvalidBuffer {
                value: self.buffer,
                max: MAX_BUFFER,
            });
        }
        if self.layer_property.is_empty() {
            return Err(ConfigError::EmptyLayerProperty);
        }
        for (layer, range) in &self.layers {
            if range.minzoom > range.maxzoom {
                return Err(ConfigError::InvalidLayerRange {
                    layer: layer.clone(),
                    minzoom: range.minzoom,
                    maxzoom: range.maxzoom,
                });
            }
        }
        Ok(())
    }

    /// Simplification tolerance at `zoom` in face-unit coordinates; zero at `maxzoom`.
    pub fn zoom_tolerance(&self, zoom: u8) -> f64 {
        if zoom >= self.maxzoom {
            return 0.0;
        }
        self.tolerance / ((1u64 << zoom) as f64 * self.extent as f64)
    }

    /// Squared tolerance used for Douglas-Peucker weights at projection time.
    pub fn projection_sq_tolerance(&self) -> f64 {
        let tolerance = self.tolerance / ((1u64 << self.maxzoom) as f64 * self.extent as f64);
        tolerance * tolerance
    }

    /// Layer a feature belongs to.
    pub fn layer_name<'a>(&self, properties: &'a Properties) -> &'a str {
        properties
            .get(&self.layer_property)
            .and_then(|value| value.as_str())
            .unwrap_or(DEFAULT_LAYER_NAME)
    }

    /// Whether `layer` is emitted at `zoom`.
    pub fn layer_visible(&self, layer: &str, zoom: u8) -> bool {
        self.layers
            .get(layer)
            .map_or(true, |range| range.contains(zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let config = TileIndexConfig::default();
        assert_eq!(config.maxzoom, 20);
        assert_eq!(config.index_maxzoom, 4);
        assert_eq!(config.extent, 8192);
        assert_eq!(config.buffer, 64.0 / 8192.0);
        assert_eq!(config.layer_property, "__layer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TileIndexConfig::new()
            .with_projection(Projection::WebMercator)
            .with_maxzoom(14)
            .with_index_maxzoom(2)
            .with_layer("water", 0, 8);
        assert_eq!(config.projection, Projection::WebMercator);
        assert_eq!(config.layers["water"], LayerZoomRange::new(0, 8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let cases = [
            TileIndexConfig::new().with_maxzoom(25),
            TileIndexConfig::new().with_minzoom(5).with_maxzoom(4).with_index_maxzoom(0),
            TileIndexConfig::new().with_maxzoom(3),
            TileIndexConfig::new().with_tolerance(-1.0),
            TileIndexConfig::new().with_tolerance(f64::NAN),
            TileIndexConfig::new().with_extent(0),
            TileIndexConfig::new().with_buffer(0.6),
            TileIndexConfig::new().with_layer_property(""),
            TileIndexConfig::new().with_layer("roads", 9, 3),
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_validate_error_details() {
        let err = TileIndexConfig::new().with_maxzoom(3).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::IndexMaxzoomAboveMaxzoom {
                index_maxzoom: 4,
                maxzoom: 3
            }
        );
    }

    #[test]
    fn test_zoom_tolerance() {
        let config = TileIndexConfig::new().with_maxzoom(10);
        assert_eq!(config.zoom_tolerance(0), 3.0 / 8192.0);
        assert_eq!(config.zoom_tolerance(1), 3.0 / 16384.0);
        assert_eq!(config.zoom_tolerance(10), 0.0);
    }

    #[test]
    fn test_layer_lookup() {
        let config = TileIndexConfig::new().with_layer("water", 2, 5);
        let props = json!({"__layer": "water", "name": "lake"});
        let props = props.as_object().unwrap();
        assert_eq!(config.layer_name(props), "water");
        assert_eq!(config.layer_name(&Properties::new()), DEFAULT_LAYER_NAME);

        let numeric = json!({"__layer": 3});
        assert_eq!(config.layer_name(numeric.as_object().unwrap()), DEFAULT_LAYER_NAME);

        assert!(!config.layer_visible("water", 1));
        assert!(config.layer_visible("water", 5));
        assert!(config.layer_visible("roads", 0));
    }
}
