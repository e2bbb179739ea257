//! Projected feature model.

use std::sync::Arc;

use crate::coord::Face;

/// Free-form feature properties.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A projected vertex.
///
/// `t` is the Douglas-Peucker importance: the squared distance at which the
/// vertex starts to matter. Endpoints and clip intersections carry `1.0`,
/// which keeps them at every zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorPoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl VectorPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, t: 0.0 }
    }

    /// A vertex that survives simplification at any tolerance.
    pub const fn fixed(x: f64, y: f64) -> Self {
        Self { x, y, t: 1.0 }
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// A line string or polygon ring.
pub type Line = Vec<VectorPoint>;

/// Clipping axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Axis-aligned bounds in face-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Bounds containing nothing; extending it with a point yields that point.
    pub const fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn extend(&mut self, p: &VectorPoint) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn merge(&mut self, other: &BBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// `(min, max)` along one axis.
    pub fn range(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::X => (self.min_x, self.max_x),
            Axis::Y => (self.min_y, self.max_y),
        }
    }

    pub fn contains(&self, p: &VectorPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Typed geometry in face-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(VectorPoint),
    MultiPoint(Vec<VectorPoint>),
    LineString(Line),
    MultiLineString(Vec<Line>),
    /// Outer ring followed by holes
    Polygon(Vec<Line>),
    MultiPolygon(Vec<Vec<Line>>),
}

impl Geometry {
    /// Output type tag: 1 points, 2 lines, 3 polygon, 4 multipolygon.
    pub fn type_tag(&self) -> u8 {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => 1,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => 2,
            Geometry::Polygon(_) => 3,
            Geometry::MultiPolygon(_) => 4,
        }
    }

    /// Calls `f` for every vertex.
    pub fn for_each_point(&self, mut f: impl FnMut(&VectorPoint)) {
        match self {
            Geometry::Point(p) => f(p),
            Geometry::MultiPoint(points) | Geometry::LineString(points) => points.iter().for_each(f),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().for_each(f)
            }
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(f),
        }
    }

    pub fn num_points(&self) -> usize {
        let mut count = 0;
        self.for_each_point(|_| count += 1);
        count
    }

    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        self.for_each_point(|p| bbox.extend(p));
        bbox
    }
}

/// A feature projected onto one face, ready for tiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<u64>,
    pub face: Face,
    /// Shared between the per-face and per-tile copies of a source feature
    pub properties: Arc<Properties>,
    pub geometry: Geometry,
    pub bbox: BBox,
}

impl Feature {
    /// Creates a feature, computing its bounds from the geometry.
    pub fn new(id: Option<u64>, face: Face, properties: Arc<Properties>, geometry: Geometry) -> Self {
        let bbox = geometry.bbox();
        Self {
            id,
            face,
            properties,
            geometry,
            bbox,
        }
    }

    /// Same id, face and properties around new geometry.
    pub fn with_geometry(&self, geometry: Geometry) -> Self {
        Self::new(self.id, self.face, Arc::clone(&self.properties), geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_of_polygon() {
        let ring = vec![
            VectorPoint::new(0.1, 0.2),
            VectorPoint::new(0.4, 0.2),
            VectorPoint::new(0.4, 0.7),
            VectorPoint::new(0.1, 0.2),
        ];
        let geometry = Geometry::Polygon(vec![ring]);
        assert_eq!(geometry.bbox(), BBox::new(0.1, 0.2, 0.4, 0.7));
        assert_eq!(geometry.num_points(), 4);
        assert_eq!(geometry.type_tag(), 3);
    }

    #[test]
    fn test_empty_bbox() {
        let mut bbox = BBox::empty();
        assert!(bbox.is_empty());
        bbox.extend(&VectorPoint::new(0.5, 0.25));
        assert!(!bbox.is_empty());
        assert_eq!(bbox.range(Axis::Y), (0.25, 0.25));
    }

    #[test]
    fn test_type_tags() {
        let p = VectorPoint::new(0.0, 0.0);
        assert_eq!(Geometry::Point(p).type_tag(), 1);
        assert_eq!(Geometry::MultiPoint(vec![p]).type_tag(), 1);
        assert_eq!(Geometry::LineString(vec![p, p]).type_tag(), 2);
        assert_eq!(Geometry::MultiLineString(vec![]).type_tag(), 2);
        assert_eq!(Geometry::MultiPolygon(vec![]).type_tag(), 4);
    }
}
