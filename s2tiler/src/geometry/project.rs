//! Projection of source features onto tiling faces.
//!
//! Under S2, a lon/lat feature whose vertices land on several cube faces is
//! split: for each face it touches, the whole geometry is re-expressed in
//! that face's frame and clipped to the face square plus [`SEAM_BUFFER`].
//! Every resulting line and ring is then annotated with Douglas-Peucker
//! importance.

use std::sync::Arc;

use super::clip::clip_line;
use super::error::InputError;
use super::input::{CoordinateSpace, GeometryInput, Position, SourceCollection, SourceFeature};
use super::simplify::build_sq_dists;
use super::types::{BBox, Feature, Geometry, Line, VectorPoint};
use crate::cell::Projection;
use crate::coord::{self, Face, LonLat};

/// Overlap kept past a face edge when geometry is split at a seam, as a
/// fraction of the face width.
pub const SEAM_BUFFER: f64 = 0.0625;

/// `FACE_RULES[target][current] = (rotation, dx, dy)` maps face-local `(s, t)`
/// on `current` into the frame of `target`. Exact on shared edges; rules
/// between opposite faces are only a rough continuation.
const FACE_RULES: [[(i16, f64, f64); 6]; 6] = [
    [(0, 0.0, 0.0), (0, 1.0, 0.0), (90, 0.0, 1.0), (-90, 2.0, 0.0), (-90, -1.0, 0.0), (0, 0.0, -1.0)],
    [(0, -1.0, 0.0), (0, 0.0, 0.0), (0, 0.0, 1.0), (-90, 1.0, 0.0), (-90, 2.0, 0.0), (90, 0.0, -1.0)],
    [(-90, -1.0, 0.0), (0, 0.0, -1.0), (0, 0.0, 0.0), (0, 1.0, 0.0), (90, 0.0, 1.0), (-90, 2.0, 0.0)],
    [(-90, 2.0, 0.0), (90, 0.0, -1.0), (0, -1.0, 0.0), (0, 0.0, 0.0), (0, 0.0, 1.0), (-90, 1.0, 0.0)],
    [(90, 0.0, 1.0), (-90, 2.0, 0.0), (-90, -1.0, 0.0), (0, 0.0, -1.0), (0, 0.0, 0.0), (0, 1.0, 0.0)],
    [(0, 0.0, 1.0), (-90, 1.0, 0.0), (-90, 2.0, 0.0), (90, 0.0, -1.0), (0, -1.0, 0.0), (0, 0.0, 0.0)],
];

/// A source vertex placed on a face.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placed {
    face: Face,
    s: f64,
    t: f64,
}

impl Placed {
    fn local(&self) -> VectorPoint {
        VectorPoint::new(self.s, self.t)
    }

    /// Re-expresses this vertex in the frame of `target`.
    fn on_face(&self, target: Face) -> VectorPoint {
        if self.face == target {
            return self.local();
        }
        let (rotation, dx, dy) = FACE_RULES[target.index()][self.face.index()];
        let (s, t) = match rotation {
            90 => (1.0 - self.t, self.s),
            -90 => (self.t, 1.0 - self.s),
            _ => (self.s, self.t),
        };
        VectorPoint::new(s + dx, t + dy)
    }
}

/// Values grouped by face, in first-seen order.
struct FaceGroups<T> {
    groups: Vec<(Face, T)>,
}

impl<T: Default> FaceGroups<T> {
    fn new() -> Self {
        Self { groups: Vec::new() }
    }

    fn entry(&mut self, face: Face) -> &mut T {
        let index = match self.groups.iter().position(|(f, _)| *f == face) {
            Some(index) => index,
            None => {
                self.groups.push((face, T::default()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index].1
    }

    fn into_geometries(self, build: impl Fn(T) -> Geometry) -> Vec<(Face, Geometry)> {
        self.groups.into_iter().map(|(face, value)| (face, build(value))).collect()
    }
}

/// Converts source features into face-local [`Feature`]s.
#[derive(Debug, Clone, Copy)]
pub struct GeometryProjector {
    projection: Projection,
    sq_tolerance: f64,
}

impl GeometryProjector {
    /// # Arguments
    ///
    /// * `projection` - Target tiling scheme
    /// * `sq_tolerance` - Squared simplification tolerance at the deepest zoom,
    ///   in unit-square units
    pub fn new(projection: Projection, sq_tolerance: f64) -> Self {
        Self {
            projection,
            sq_tolerance,
        }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Projects every feature; the first invalid one aborts the whole set.
    pub fn project_collection(&self, collection: &SourceCollection) -> Result<Vec<Feature>, InputError> {
        let mut projected = Vec::with_capacity(collection.len());
        for (index, feature) in collection.features.iter().enumerate() {
            projected.extend(self.project_feature(feature, index)?);
        }
        Ok(projected)
    }

    /// Projects one feature into one feature per face it touches.
    ///
    /// `index` is only used to label errors.
    pub fn project_feature(&self, feature: &SourceFeature, index: usize) -> Result<Vec<Feature>, InputError> {
        feature.geometry.validate(index)?;

        let place = |p: &Position| self.place(feature.space, p);
        let pieces = match &feature.geometry {
            GeometryInput::Point(p) => {
                let placed = place(p);
                vec![(placed.face, Geometry::Point(placed.local()))]
            }
            GeometryInput::MultiPoint(points) => {
                let mut groups = FaceGroups::<Vec<VectorPoint>>::new();
                for p in points {
                    let placed = place(p);
                    groups.entry(placed.face).push(placed.local());
                }
                groups.into_geometries(|mut points| {
                    if points.len() == 1 {
                        Geometry::Point(points.remove(0))
                    } else {
                        Geometry::MultiPoint(points)
                    }
                })
            }
            GeometryInput::LineString(line) => self.project_lines(std::slice::from_ref(line), &place),
            GeometryInput::MultiLineString(lines) => self.project_lines(lines, &place),
            GeometryInput::Polygon(rings) => {
                let mut groups = FaceGroups::<Vec<Vec<Line>>>::new();
                for (face, polygon) in self.project_polygon(rings, &place) {
                    groups.entry(face).push(polygon);
                }
                groups.into_geometries(polygons_geometry)
            }
            GeometryInput::MultiPolygon(polygons) => {
                let mut groups = FaceGroups::<Vec<Vec<Line>>>::new();
                for rings in polygons {
                    for (face, polygon) in self.project_polygon(rings, &place) {
                        groups.entry(face).push(polygon);
                    }
                }
                groups.into_geometries(Geometry::MultiPolygon)
            }
        };

        let properties = Arc::new(feature.properties.clone());
        Ok(pieces
            .into_iter()
            .map(|(face, geometry)| Feature::new(feature.id, face, Arc::clone(&properties), geometry))
            .collect())
    }

    fn place(&self, space: CoordinateSpace, p: &Position) -> Placed {
        let (x, y) = (p[0], p[1]);
        match (self.projection, space) {
            (Projection::S2, CoordinateSpace::LonLat) => {
                let (face, s, t) = coord::lon_lat_to_face_st(LonLat::new(x, y));
                Placed { face, s, t }
            }
            (Projection::S2, CoordinateSpace::FaceSt(face)) => Placed { face, s: x, t: y },
            (Projection::WebMercator, CoordinateSpace::LonLat) => {
                let (s, t) = coord::lon_lat_to_unit(LonLat::new(x, y));
                Placed {
                    face: Face::ALL[0],
                    s,
                    t,
                }
            }
            (Projection::WebMercator, CoordinateSpace::FaceSt(face)) => {
                let (s, t) = coord::lon_lat_to_unit(coord::face_st_to_lon_lat(face, x, y));
                Placed {
                    face: Face::ALL[0],
                    s,
                    t,
                }
            }
        }
    }

    fn project_lines(&self, lines: &[Vec<Position>], place: &impl Fn(&Position) -> Placed) -> Vec<(Face, Geometry)> {
        let mut groups = FaceGroups::<Vec<Line>>::new();
        for line in lines {
            let placed: Vec<Placed> = line.iter().map(place).collect();
            for (face, mut piece) in split_at_seams(&placed, false) {
                build_sq_dists(&mut piece, self.sq_tolerance);
                groups.entry(face).push(piece);
            }
        }
        groups.into_geometries(|mut lines| {
            if lines.len() == 1 {
                Geometry::LineString(lines.remove(0))
            } else {
                Geometry::MultiLineString(lines)
            }
        })
    }

    /// Splits one polygon; holes only join the pieces of their outer ring
    /// on the same face.
    fn project_polygon(
        &self,
        rings: &[Vec<Position>],
        place: &impl Fn(&Position) -> Placed,
    ) -> Vec<(Face, Vec<Line>)> {
        let Some((outer, holes)) = rings.split_first() else {
            return Vec::new();
        };

        let outer: Vec<Placed> = outer.iter().map(place).collect();
        let mut polygons: Vec<(Face, Vec<Line>)> = split_at_seams(&outer, true)
            .into_iter()
            .map(|(face, ring)| (face, vec![ring]))
            .collect();

        for hole in holes {
            let hole: Vec<Placed> = hole.iter().map(place).collect();
            for (face, ring) in split_at_seams(&hole, true) {
                if let Some((_, polygon)) = polygons.iter_mut().find(|(f, _)| *f == face) {
                    polygon.push(ring);
                }
            }
        }

        for (_, polygon) in &mut polygons {
            for ring in polygon.iter_mut() {
                build_sq_dists(ring, self.sq_tolerance);
            }
        }
        polygons
    }
}

fn polygons_geometry(mut polygons: Vec<Vec<Line>>) -> Geometry {
    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(polygons)
    }
}

/// One piece per face touched, each clipped to that face plus the seam buffer.
fn split_at_seams(points: &[Placed], is_polygon: bool) -> Vec<(Face, Line)> {
    let mut faces: Vec<Face> = Vec::new();
    for p in points {
        if !faces.contains(&p.face) {
            faces.push(p.face);
        }
    }

    if let [face] = faces[..] {
        return vec![(face, points.iter().map(Placed::local).collect())];
    }

    let bounds = BBox::new(-SEAM_BUFFER, -SEAM_BUFFER, 1.0 + SEAM_BUFFER, 1.0 + SEAM_BUFFER);
    faces
        .into_iter()
        .flat_map(|face| {
            let local: Line = points.iter().map(|p| p.on_face(face)).collect();
            clip_line(&local, &bounds, is_polygon)
                .into_iter()
                .map(move |piece| (face, piece))
        })
        .collect()
}
