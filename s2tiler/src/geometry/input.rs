//! Source feature input.
//!
//! Two JSON envelope families are accepted:
//!
//! - `FeatureCollection` / `Feature`: GeoJSON with `[lon, lat]` positions
//! - `S2FeatureCollection` / `S2Feature`: positions are `[s, t]` on the
//!   feature's `face` (default 0)
//!
//! Positions carry two or three numbers; the third is ignored. Features with
//! a `null` geometry are skipped with a warning; anything else malformed
//! rejects the whole input.

use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use super::error::InputError;
use super::types::Properties;
use crate::coord::Face;

/// A position as it appears in the input: `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// Source geometry, one variant per GeoJSON geometry type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeometryInput {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl GeometryInput {
    pub fn kind(&self) -> &'static str {
        match self {
            GeometryInput::Point(_) => "Point",
            GeometryInput::MultiPoint(_) => "MultiPoint",
            GeometryInput::LineString(_) => "LineString",
            GeometryInput::MultiLineString(_) => "MultiLineString",
            GeometryInput::Polygon(_) => "Polygon",
            GeometryInput::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Checks position arity, finiteness and that no line or ring is empty.
    pub(crate) fn validate(&self, feature: usize) -> Result<(), InputError> {
        let kind = self.kind();
        let check_position = |p: &Position| -> Result<(), InputError> {
            if !(2..=3).contains(&p.len()) {
                return Err(InputError::InvalidPosition {
                    feature,
                    len: p.len(),
                });
            }
            if p.iter().any(|c| !c.is_finite()) {
                return Err(InputError::NonFiniteCoordinate { feature });
            }
            Ok(())
        };
        let check_line = |line: &[Position]| -> Result<(), InputError> {
            if line.is_empty() {
                return Err(InputError::EmptyGeometry { feature, kind });
            }
            line.iter().try_for_each(check_position)
        };
        let check_polygon = |rings: &[Vec<Position>]| -> Result<(), InputError> {
            if rings.is_empty() {
                return Err(InputError::EmptyGeometry { feature, kind });
            }
            rings.iter().try_for_each(|ring| check_line(ring))
        };

        match self {
            GeometryInput::Point(p) => check_position(p),
            GeometryInput::MultiPoint(points) | GeometryInput::LineString(points) => check_line(points),
            GeometryInput::MultiLineString(lines) => {
                if lines.is_empty() {
                    return Err(InputError::EmptyGeometry { feature, kind });
                }
                lines.iter().try_for_each(|line| check_line(line))
            }
            GeometryInput::Polygon(rings) => check_polygon(rings),
            GeometryInput::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    return Err(InputError::EmptyGeometry { feature, kind });
                }
                polygons.iter().try_for_each(|rings| check_polygon(rings))
            }
        }
    }
}

/// How a feature's positions are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSpace {
    /// `[lon, lat]` in degrees
    LonLat,
    /// `[s, t]` on one cube face
    FaceSt(Face),
}

/// A feature as read from the input, before projection.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    pub id: Option<u64>,
    pub properties: Properties,
    pub geometry: GeometryInput,
    pub space: CoordinateSpace,
}

impl SourceFeature {
    /// A feature with `[lon, lat]` positions.
    pub fn lon_lat(geometry: GeometryInput) -> Self {
        Self {
            id: None,
            properties: Properties::new(),
            geometry,
            space: CoordinateSpace::LonLat,
        }
    }

    /// A feature with `[s, t]` positions on `face`.
    pub fn face_st(face: Face, geometry: GeometryInput) -> Self {
        Self {
            id: None,
            properties: Properties::new(),
            geometry,
            space: CoordinateSpace::FaceSt(face),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An ordered set of source features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCollection {
    pub features: Vec<SourceFeature>,
}

impl SourceCollection {
    pub fn new(features: Vec<SourceFeature>) -> Self {
        Self { features }
    }

    pub fn push(&mut self, feature: SourceFeature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parses one of the accepted JSON envelopes.
    pub fn from_json_str(json: &str) -> Result<Self, InputError> {
        let envelope: Envelope = serde_json::from_str(json)?;
        envelope.into_collection()
    }

    /// Converts an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, InputError> {
        let envelope: Envelope = serde_json::from_value(value)?;
        envelope.into_collection()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InputError> {
        let envelope: Envelope = serde_json::from_reader(reader)?;
        envelope.into_collection()
    }

    /// Reads a JSON file, transparently decompressing `.gz` files.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        use flate2::read::GzDecoder;

        let path = path.as_ref();
        let file = File::open(path)?;

        let collection = if path.extension().is_some_and(|ext| ext == "gz") {
            debug!(path = %path.display(), "Loading gzip compressed features");
            Self::from_reader(BufReader::new(GzDecoder::new(file)))?
        } else {
            debug!(path = %path.display(), "Loading features");
            Self::from_reader(BufReader::new(file))?
        };

        debug!(path = %path.display(), features = collection.len(), "Features loaded");
        Ok(collection)
    }
}

impl FromIterator<SourceFeature> for SourceCollection {
    fn from_iter<I: IntoIterator<Item = SourceFeature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// JSON envelopes
// ============================================================================

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Envelope {
    FeatureCollection { features: Vec<RawFeature> },
    Feature(RawFeature),
    S2FeatureCollection { features: Vec<RawFeature> },
    S2Feature(RawFeature),
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    face: Option<u8>,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default)]
    geometry: Option<GeometryInput>,
}

impl Envelope {
    fn into_collection(self) -> Result<SourceCollection, InputError> {
        let (raw, on_faces) = match self {
            Envelope::FeatureCollection { features } => (features, false),
            Envelope::Feature(feature) => (vec![feature], false),
            Envelope::S2FeatureCollection { features } => (features, true),
            Envelope::S2Feature(feature) => (vec![feature], true),
        };

        let mut features = Vec::with_capacity(raw.len());
        for (index, feature) in raw.into_iter().enumerate() {
            if let Some(feature) = feature.into_source(index, on_faces)? {
                features.push(feature);
            }
        }
        Ok(SourceCollection::new(features))
    }
}

impl RawFeature {
    fn into_source(self, index: usize, on_faces: bool) -> Result<Option<SourceFeature>, InputError> {
        let Some(geometry) = self.geometry else {
            warn!(feature = index, "Skipping feature without geometry");
            return Ok(None);
        };
        geometry.validate(index)?;

        let space = if on_faces {
            let face = Face::new(self.face.unwrap_or(0))
                .map_err(|source| InputError::InvalidFace { feature: index, source })?;
            CoordinateSpace::FaceSt(face)
        } else {
            CoordinateSpace::LonLat
        };

        let id = match self.id {
            None | Some(Value::Null) => None,
            Some(value) => {
                let id = value.as_u64();
                if id.is_none() {
                    warn!(feature = index, id = %value, "Ignoring non-integer feature id");
                }
                id
            }
        };

        Ok(Some(SourceFeature {
            id,
            properties: self.properties.unwrap_or_default(),
            geometry,
            space,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_feature_collection() {
        let collection = SourceCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": 7,
                    "properties": {"name": "origin"},
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
                },
                {
                    "type": "Feature",
                    "properties": null,
                    "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1, 20]]}
                }
            ]
        }))
        .unwrap();

        assert_eq!(collection.len(), 2);
        let first = &collection.features[0];
        assert_eq!(first.id, Some(7));
        assert_eq!(first.space, CoordinateSpace::LonLat);
        assert_eq!(first.properties["name"], "origin");
        assert_eq!(first.geometry, GeometryInput::Point(vec![0.0, 0.0]));
        assert!(collection.features[1].properties.is_empty());
    }

    #[test]
    fn test_parse_single_s2_feature() {
        let collection = SourceCollection::from_json_str(
            r#"{"type": "S2Feature", "face": 3,
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [0.25, 0.75]}}"#,
        )
        .unwrap();
        assert_eq!(collection.features[0].space, CoordinateSpace::FaceSt(Face::ALL[3]));
    }

    #[test]
    fn test_s2_face_defaults_to_zero() {
        let collection = SourceCollection::from_value(json!({
            "type": "S2FeatureCollection",
            "features": [{"type": "S2Feature", "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}}]
        }))
        .unwrap();
        assert_eq!(collection.features[0].space, CoordinateSpace::FaceSt(Face::ALL[0]));
    }

    #[test]
    fn test_null_geometry_is_skipped() {
        let collection = SourceCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1, 2]}}
            ]
        }))
        .unwrap();
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_rejects_bad_position_arity() {
        let err = SourceCollection::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [1.0]}
        }))
        .unwrap_err();
        assert!(matches!(err, InputError::InvalidPosition { feature: 0, len: 1 }));
    }

    #[test]
    fn test_rejects_empty_ring() {
        let err = SourceCollection::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[]]}
        }))
        .unwrap_err();
        assert!(matches!(err, InputError::EmptyGeometry { kind: "Polygon", .. }));
    }

    #[test]
    fn test_rejects_unknown_geometry_type() {
        let result = SourceCollection::from_json_str(
            r#"{"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": []}}"#,
        );
        assert!(matches!(result, Err(InputError::Json(_))));
    }

    #[test]
    fn test_rejects_invalid_face() {
        let err = SourceCollection::from_value(json!({
            "type": "S2Feature",
            "face": 6,
            "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}
        }))
        .unwrap_err();
        assert!(matches!(err, InputError::InvalidFace { feature: 0, .. }));
    }

    #[test]
    fn test_non_integer_id_is_dropped() {
        let collection = SourceCollection::from_value(json!({
            "type": "Feature",
            "id": "abc",
            "geometry": {"type": "Point", "coordinates": [0, 0]}
        }))
        .unwrap();
        assert_eq!(collection.features[0].id, None);
    }

    #[test]
    fn test_from_path_reads_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let json = r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [10, 20]}}"#;

        let plain = temp_dir.path().join("features.json");
        std::fs::write(&plain, json).unwrap();

        let compressed = temp_dir.path().join("features.json.gz");
        let mut encoder = GzEncoder::new(File::create(&compressed).unwrap(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let a = SourceCollection::from_path(&plain).unwrap();
        let b = SourceCollection::from_path(&compressed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.features[0].geometry, GeometryInput::Point(vec![10.0, 20.0]));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = SourceCollection::from_path("/nonexistent/features.json");
        assert!(matches!(result, Err(InputError::Io(_))));
    }

    #[test]
    fn test_builder() {
        let feature = SourceFeature::lon_lat(GeometryInput::Point(vec![1.0, 2.0]))
            .with_id(3)
            .with_property("__layer", "roads");
        assert_eq!(feature.id, Some(3));
        assert_eq!(feature.properties["__layer"], "roads");
    }
}
