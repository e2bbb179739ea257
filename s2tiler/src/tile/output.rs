//! Integer tile output.
//!
//! Face-unit coordinates are mapped to `[0, extent]` within the tile,
//! rounded, and cleaned: consecutive duplicates go, lines need two vertices
//! and rings four.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Tile, TileFeature, TileGeometry};
use crate::coord::Face;
use crate::geometry::{Properties, VectorPoint};

/// A tile ready for rendering or serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorTile {
    pub face: Face,
    pub zoom: u8,
    pub i: u32,
    pub j: u32,
    /// Layers by name
    pub layers: BTreeMap<String, VectorLayer>,
}

impl VectorTile {
    pub fn layer(&self, name: &str) -> Option<&VectorLayer> {
        self.layers.get(name)
    }

    pub fn num_features(&self) -> usize {
        self.layers.values().map(|layer| layer.features.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_features() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorLayer {
    pub extent: u32,
    pub features: Vec<VectorFeature>,
}

/// A feature in output units.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    pub id: Option<u64>,
    pub geometry: VectorGeometry,
    pub properties: Arc<Properties>,
}

impl VectorFeature {
    /// 1 points, 2 lines, 3 polygon, 4 multipolygon.
    pub fn type_tag(&self) -> u8 {
        self.geometry.type_tag()
    }
}

impl Serialize for VectorFeature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.id.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("VectorFeature", len)?;
        if let Some(id) = self.id {
            state.serialize_field("id", &id)?;
        } else {
            state.skip_field("id")?;
        }
        state.serialize_field("type", &self.type_tag())?;
        state.serialize_field("geometry", &self.geometry)?;
        state.serialize_field("properties", self.properties.as_ref())?;
        state.end()
    }
}

/// Output geometry as `[x, y]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VectorGeometry {
    Points(Vec<[i32; 2]>),
    Lines(Vec<Vec<[i32; 2]>>),
    Polygon(Vec<Vec<[i32; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[i32; 2]>>>),
}

impl VectorGeometry {
    pub fn type_tag(&self) -> u8 {
        match self {
            VectorGeometry::Points(_) => 1,
            VectorGeometry::Lines(_) => 2,
            VectorGeometry::Polygon(_) => 3,
            VectorGeometry::MultiPolygon(_) => 4,
        }
    }
}

/// Maps face units into one tile's output grid.
struct Transform {
    scale: f64,
    extent: f64,
    i: f64,
    j: f64,
}

impl Transform {
    fn point(&self, p: &VectorPoint) -> [i32; 2] {
        [
            (self.extent * (p.x * self.scale - self.i)).round() as i32,
            (self.extent * (p.y * self.scale - self.j)).round() as i32,
        ]
    }

    fn line(&self, line: &[VectorPoint]) -> Vec<[i32; 2]> {
        let mut out: Vec<[i32; 2]> = Vec::with_capacity(line.len());
        for p in line {
            let q = self.point(p);
            if out.last() != Some(&q) {
                out.push(q);
            }
        }
        out
    }

    fn polygon(&self, rings: &[Vec<VectorPoint>]) -> Option<Vec<Vec<[i32; 2]>>> {
        let mut out = Vec::with_capacity(rings.len());
        for (index, ring) in rings.iter().enumerate() {
            let ring = self.line(ring);
            if ring.len() >= 4 {
                out.push(ring);
            } else if index == 0 {
                return None;
            }
        }
        Some(out)
    }
}

pub(super) fn transform(tile: &Tile, extent: u32) -> VectorTile {
    let transform = Transform {
        scale: (1u64 << tile.zoom) as f64,
        extent: extent as f64,
        i: tile.i as f64,
        j: tile.j as f64,
    };

    let layers = tile
        .layers
        .iter()
        .filter_map(|(name, features)| {
            let features: Vec<VectorFeature> = features
                .iter()
                .filter_map(|feature| transform_feature(&transform, feature))
                .collect();
            (!features.is_empty()).then(|| (name.clone(), VectorLayer { extent, features }))
        })
        .collect();

    VectorTile {
        face: tile.face,
        zoom: tile.zoom,
        i: tile.i,
        j: tile.j,
        layers,
    }
}

fn transform_feature(transform: &Transform, feature: &TileFeature) -> Option<VectorFeature> {
    let geometry = match &feature.geometry {
        TileGeometry::Points(points) => VectorGeometry::Points(points.iter().map(|p| transform.point(p)).collect()),
        TileGeometry::Lines(lines) => {
            let lines: Vec<_> = lines
                .iter()
                .map(|line| transform.line(line))
                .filter(|line| line.len() >= 2)
                .collect();
            if lines.is_empty() {
                return None;
            }
            VectorGeometry::Lines(lines)
        }
        TileGeometry::Polygon(rings) => VectorGeometry::Polygon(transform.polygon(rings)?),
        TileGeometry::MultiPolygon(polygons) => {
            let polygons: Vec<_> = polygons.iter().filter_map(|rings| transform.polygon(rings)).collect();
            if polygons.is_empty() {
                return None;
            }
            VectorGeometry::MultiPolygon(polygons)
        }
    };

    Some(VectorFeature {
        id: feature.id,
        geometry,
        properties: Arc::clone(&feature.properties),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellId;
    use crate::geometry::{build_sq_dists, Feature, Geometry, Line};
    use crate::index::TileIndexConfig;
    use serde_json::json;

    fn tile_with(geometry: Geometry, id: u64, config: &TileIndexConfig) -> Tile {
        let properties = json!({"name": "x"}).as_object().cloned().unwrap();
        let feature = Feature::new(Some(42), Face::ALL[0], Arc::new(properties), geometry);
        Tile::create(&[feature], id, config)
    }

    fn weighted(coords: &[(f64, f64)]) -> Line {
        let mut line: Line = coords.iter().map(|&(x, y)| VectorPoint::new(x, y)).collect();
        build_sq_dists(&mut line, 0.0);
        line
    }

    #[test]
    fn test_center_point_in_root_tile() {
        let config = TileIndexConfig::default();
        let root = CellId::from_face(Face::ALL[0]).raw();
        let mut tile = tile_with(Geometry::Point(VectorPoint::new(0.5, 0.5)), root, &config);
        let out = tile.output(8192);
        let layer = out.layer("default").unwrap();
        assert_eq!(layer.extent, 8192);
        assert_eq!(layer.features.len(), 1);
        assert_eq!(layer.features[0].geometry, VectorGeometry::Points(vec![[4096, 4096]]));
        assert_eq!(layer.features[0].type_tag(), 1);
    }

    #[test]
    fn test_child_tile_offsets() {
        let config = TileIndexConfig::default();
        // zoom 1, (i, j) = (1, 0) covers x in [0.5, 1], y in [0, 0.5]
        let id = CellId::from_face_zoom_ij(Face::ALL[0], 1, 1, 0).raw();
        let mut tile = tile_with(Geometry::Point(VectorPoint::new(0.75, 0.125)), id, &config);
        let out = tile.output(4096);
        assert_eq!(
            out.layers["default"].features[0].geometry,
            VectorGeometry::Points(vec![[2048, 1024]])
        );
        assert_eq!((out.zoom, out.i, out.j), (1, 1, 0));
    }

    #[test]
    fn test_collapsed_ring_is_dropped() {
        let config = TileIndexConfig::default().with_maxzoom(0).with_index_maxzoom(0);
        let root = CellId::from_face(Face::ALL[0]).raw();
        // a ring smaller than one output unit rounds to a single vertex
        let ring = weighted(&[(0.5, 0.5), (0.50001, 0.5), (0.50001, 0.50001), (0.5, 0.5)]);
        let mut tile = tile_with(Geometry::Polygon(vec![ring]), root, &config);
        assert!(tile.output(8192).is_empty());
    }

    #[test]
    fn test_duplicate_vertices_are_merged() {
        let config = TileIndexConfig::default().with_maxzoom(0).with_index_maxzoom(0);
        let root = CellId::from_face(Face::ALL[0]).raw();
        let line = weighted(&[(0.0, 0.0), (0.00001, 0.0), (1.0, 0.0)]);
        let mut tile = tile_with(Geometry::LineString(line), root, &config);
        let out = tile.output(8192);
        assert_eq!(
            out.layers["default"].features[0].geometry,
            VectorGeometry::Lines(vec![vec![[0, 0], [8192, 0]]])
        );
    }

    #[test]
    fn test_output_is_memoized() {
        let config = TileIndexConfig::default();
        let root = CellId::from_face(Face::ALL[0]).raw();
        let mut tile = tile_with(Geometry::Point(VectorPoint::new(0.5, 0.5)), root, &config);
        let first = tile.output(8192).clone();
        // a different extent is ignored once the output exists
        let second = tile.output(512).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialized_shape() {
        let config = TileIndexConfig::default();
        let root = CellId::from_face(Face::ALL[0]).raw();
        let mut tile = tile_with(Geometry::Point(VectorPoint::new(0.5, 0.5)), root, &config);
        let value = serde_json::to_value(tile.output(8192)).unwrap();
        assert_eq!(
            value,
            json!({
                "face": 0,
                "zoom": 0,
                "i": 0,
                "j": 0,
                "layers": {
                    "default": {
                        "extent": 8192,
                        "features": [{
                            "id": 42,
                            "type": 1,
                            "geometry": [[4096, 4096]],
                            "properties": {"name": "x"}
                        }]
                    }
                }
            })
        );
    }
}
