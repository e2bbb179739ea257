//! Tile synthesis.
//!
//! A [`Tile`] is created from the features that reach its cell: features
//! are bucketed into layers, simplified at the tile's zoom tolerance, and
//! counted so the index can decide whether to keep splitting. The integer
//! output ([`VectorTile`]) is produced on first request and memoized.

mod output;

pub use output::{VectorFeature, VectorGeometry, VectorLayer, VectorTile};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::coord::Face;
use crate::geometry::{line_length, rewind, signed_area, BBox, Feature, Geometry, Line, Properties, VectorPoint};
use crate::index::TileIndexConfig;

/// Simplified geometry at one tile's resolution, still in face units.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TileGeometry {
    Points(Vec<VectorPoint>),
    Lines(Vec<Line>),
    Polygon(Vec<Line>),
    MultiPolygon(Vec<Vec<Line>>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TileFeature {
    pub(crate) id: Option<u64>,
    pub(crate) properties: Arc<Properties>,
    pub(crate) geometry: TileGeometry,
}

/// One cell of the tile pyramid.
#[derive(Debug, Clone)]
pub struct Tile {
    id: u64,
    face: Face,
    zoom: u8,
    i: u32,
    j: u32,
    layers: BTreeMap<String, Vec<TileFeature>>,
    num_features: usize,
    num_points: usize,
    num_simplified: usize,
    bbox: BBox,
    /// Unclipped features, held until the tile is split
    pub(crate) source: Option<Vec<Feature>>,
    output: Option<VectorTile>,
}

impl Tile {
    /// Builds tile `id` from the features that reach it.
    pub(crate) fn create(features: &[Feature], id: u64, config: &TileIndexConfig) -> Self {
        let (face, zoom, i, j) = config.projection.to_face_zoom_ij(id);
        let tolerance = config.zoom_tolerance(zoom);
        let sq_tolerance = tolerance * tolerance;

        let mut tile = Tile {
            id,
            face,
            zoom,
            i,
            j,
            layers: BTreeMap::new(),
            num_features: features.len(),
            num_points: 0,
            num_simplified: 0,
            bbox: BBox::empty(),
            source: None,
            output: None,
        };

        for feature in features {
            tile.bbox.merge(&feature.bbox);
            tile.num_points += feature.geometry.num_points();

            let layer = config.layer_name(&feature.properties);
            if !config.layer_visible(layer, zoom) {
                continue;
            }

            let Some(geometry) = simplify_geometry(&feature.geometry, tolerance, sq_tolerance) else {
                continue;
            };
            tile.num_simplified += geometry_points(&geometry);
            tile.layers.entry(layer.to_string()).or_default().push(TileFeature {
                id: feature.id,
                properties: Arc::clone(&feature.properties),
                geometry,
            });
        }

        tile
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Tile position `(i, j)` at its zoom.
    pub fn position(&self) -> (u32, u32) {
        (self.i, self.j)
    }

    /// Features that reached this tile, before layer filtering.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Source vertices that reached this tile; drives split decisions.
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Vertices kept after simplification.
    pub fn num_simplified(&self) -> usize {
        self.num_simplified
    }

    /// Bounds of every feature that reached this tile, in face units.
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn retains_source(&self) -> bool {
        self.source.is_some()
    }

    /// Integer output at `extent`, transformed on first call.
    pub(crate) fn output(&mut self, extent: u32) -> &VectorTile {
        let tile = match self.output.take() {
            Some(tile) => tile,
            None => output::transform(self, extent),
        };
        self.output.insert(tile)
    }
}

fn geometry_points(geometry: &TileGeometry) -> usize {
    match geometry {
        TileGeometry::Points(points) => points.len(),
        TileGeometry::Lines(lines) | TileGeometry::Polygon(lines) => lines.iter().map(Vec::len).sum(),
        TileGeometry::MultiPolygon(polygons) => polygons.iter().flatten().map(Vec::len).sum(),
    }
}

fn simplify_geometry(geometry: &Geometry, tolerance: f64, sq_tolerance: f64) -> Option<TileGeometry> {
    match geometry {
        Geometry::Point(p) => Some(TileGeometry::Points(vec![*p])),
        Geometry::MultiPoint(points) => Some(TileGeometry::Points(points.clone())),
        Geometry::LineString(line) => {
            simplify_line(line, tolerance, sq_tolerance).map(|line| TileGeometry::Lines(vec![line]))
        }
        Geometry::MultiLineString(lines) => {
            let kept: Vec<Line> = lines
                .iter()
                .filter_map(|line| simplify_line(line, tolerance, sq_tolerance))
                .collect();
            (!kept.is_empty()).then_some(TileGeometry::Lines(kept))
        }
        Geometry::Polygon(rings) => simplify_polygon(rings, tolerance, sq_tolerance).map(TileGeometry::Polygon),
        Geometry::MultiPolygon(polygons) => {
            let kept: Vec<Vec<Line>> = polygons
                .iter()
                .filter_map(|rings| simplify_polygon(rings, tolerance, sq_tolerance))
                .collect();
            (!kept.is_empty()).then_some(TileGeometry::MultiPolygon(kept))
        }
    }
}

/// Keeps the vertices that matter at this tolerance. Lines shorter than the
/// tolerance vanish.
fn simplify_line(line: &[VectorPoint], tolerance: f64, sq_tolerance: f64) -> Option<Line> {
    if tolerance > 0.0 && line_length(line) < tolerance {
        return None;
    }
    Some(filter_vertices(line, tolerance, sq_tolerance))
}

/// Simplifies every ring and winds outer rings counter-clockwise, holes
/// clockwise. The polygon vanishes if its outer ring is smaller than the
/// squared tolerance.
fn simplify_polygon(rings: &[Line], tolerance: f64, sq_tolerance: f64) -> Option<Vec<Line>> {
    let mut kept = Vec::with_capacity(rings.len());
    for (index, ring) in rings.iter().enumerate() {
        let is_outer = index == 0;
        if tolerance > 0.0 && signed_area(ring).abs() < sq_tolerance {
            if is_outer {
                return None;
            }
            continue;
        }
        let mut ring = filter_vertices(ring, tolerance, sq_tolerance);
        rewind(&mut ring, !is_outer);
        kept.push(ring);
    }
    Some(kept)
}

fn filter_vertices(line: &[VectorPoint], tolerance: f64, sq_tolerance: f64) -> Line {
    line.iter()
        .filter(|p| tolerance == 0.0 || p.t > sq_tolerance)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellId, Projection};
    use crate::geometry::build_sq_dists;
    use serde_json::json;

    fn feature(geometry: Geometry, properties: serde_json::Value) -> Feature {
        let properties = properties.as_object().cloned().unwrap_or_default();
        Feature::new(None, Face::ALL[0], Arc::new(properties), geometry)
    }

    fn weighted(coords: &[(f64, f64)]) -> Line {
        let mut line: Line = coords.iter().map(|&(x, y)| VectorPoint::new(x, y)).collect();
        build_sq_dists(&mut line, 0.0);
        line
    }

    fn root() -> u64 {
        CellId::from_face(Face::ALL[0]).raw()
    }

    #[test]
    fn test_create_counts_and_bounds() {
        let config = TileIndexConfig::default();
        let features = vec![
            feature(Geometry::Point(VectorPoint::new(0.25, 0.5)), json!({})),
            feature(
                Geometry::LineString(weighted(&[(0.1, 0.1), (0.9, 0.2)])),
                json!({"__layer": "roads"}),
            ),
        ];
        let tile = Tile::create(&features, root(), &config);
        assert_eq!(tile.zoom(), 0);
        assert_eq!(tile.face(), Face::ALL[0]);
        assert_eq!(tile.num_features(), 2);
        assert_eq!(tile.num_points(), 3);
        assert_eq!(tile.num_simplified(), 3);
        assert_eq!(tile.bbox(), BBox::new(0.1, 0.1, 0.9, 0.5));
        assert_eq!(tile.layers.keys().collect::<Vec<_>>(), vec!["default", "roads"]);
        assert!(!tile.retains_source());
    }

    #[test]
    fn test_hidden_layer_still_counts_points() {
        let config = TileIndexConfig::default().with_layer("labels", 5, 10);
        let features = vec![feature(
            Geometry::Point(VectorPoint::new(0.5, 0.5)),
            json!({"__layer": "labels"}),
        )];
        let tile = Tile::create(&features, root(), &config);
        assert!(tile.layers.is_empty());
        assert_eq!(tile.num_points(), 1);
    }

    #[test]
    fn test_low_importance_vertices_are_dropped() {
        // a 1e-6 wiggle is far below the zoom-0 tolerance of 3/8192
        let line = weighted(&[(0.1, 0.5), (0.5, 0.500001), (0.9, 0.5)]);
        let features = vec![feature(Geometry::LineString(line), json!({}))];
        let tile = Tile::create(&features, root(), &TileIndexConfig::default());
        match &tile.layers["default"][0].geometry {
            TileGeometry::Lines(lines) => assert_eq!(lines[0].len(), 2),
            other => panic!("expected lines, got {:?}", other),
        }
    }

    #[test]
    fn test_maxzoom_keeps_every_vertex() {
        let config = TileIndexConfig::default().with_maxzoom(0).with_index_maxzoom(0);
        let line = weighted(&[(0.1, 0.5), (0.5, 0.500001), (0.9, 0.5)]);
        let features = vec![feature(Geometry::LineString(line), json!({}))];
        let tile = Tile::create(&features, root(), &config);
        assert_eq!(tile.num_simplified(), 3);
    }

    #[test]
    fn test_tiny_line_vanishes() {
        let line = weighted(&[(0.5, 0.5), (0.5000001, 0.5)]);
        let features = vec![feature(Geometry::LineString(line), json!({}))];
        let tile = Tile::create(&features, root(), &TileIndexConfig::default());
        assert!(tile.layers.is_empty());
    }

    #[test]
    fn test_rings_are_rewound() {
        // outer clockwise, hole counter-clockwise: both need reversing
        let outer = weighted(&[(0.1, 0.1), (0.1, 0.9), (0.9, 0.9), (0.9, 0.1), (0.1, 0.1)]);
        let hole = weighted(&[(0.4, 0.4), (0.6, 0.4), (0.6, 0.6), (0.4, 0.6), (0.4, 0.4)]);
        let features = vec![feature(Geometry::Polygon(vec![outer, hole]), json!({}))];
        let tile = Tile::create(&features, root(), &TileIndexConfig::default());
        let TileGeometry::Polygon(rings) = &tile.layers["default"][0].geometry else {
            panic!("expected a polygon");
        };
        assert!(signed_area(&rings[0]) > 0.0);
        assert!(signed_area(&rings[1]) < 0.0);
    }

    #[test]
    fn test_web_mercator_tile_position() {
        let config = TileIndexConfig::default().with_projection(Projection::WebMercator);
        let id = Projection::WebMercator.tile_id(Face::ALL[0], 3, 5, 2);
        let tile = Tile::create(&[], id, &config);
        assert_eq!((tile.zoom(), tile.position()), (3, (5, 2)));
        assert_eq!(tile.num_points(), 0);
        assert!(tile.bbox().is_empty());
    }
}
