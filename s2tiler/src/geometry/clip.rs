//! Axis-aligned clipping.
//!
//! Lines are clipped one axis at a time. Intersection vertices are fixed
//! (`t = 1`) so they survive every simplification pass. Open lines are cut
//! into separate slices where they leave the band; polygon rings stay one
//! piece and are re-closed.

use super::types::{Axis, BBox, Feature, Geometry, Line, VectorPoint};

/// Clips a line or ring to `k1 <= axis <= k2`.
pub fn clip_line_axis(line: &[VectorPoint], k1: f64, k2: f64, axis: Axis, is_polygon: bool) -> Vec<Line> {
    let mut slices = Vec::new();
    if line.is_empty() {
        return slices;
    }
    let mut slice: Line = Vec::with_capacity(line.len());

    for pair in line.windows(2) {
        let (pa, pb) = (&pair[0], &pair[1]);
        let a = pa.axis(axis);
        let b = pb.axis(axis);
        let mut exited = false;

        if a < k1 {
            // enters from below
            if b > k1 {
                slice.push(intersect(pa, pb, k1, axis));
            }
        } else if a > k2 {
            // enters from above
            if b < k2 {
                slice.push(intersect(pa, pb, k2, axis));
            }
        } else {
            slice.push(*pa);
        }

        if b < k1 && a >= k1 {
            slice.push(intersect(pa, pb, k1, axis));
            exited = true;
        }
        if b > k2 && a <= k2 {
            slice.push(intersect(pa, pb, k2, axis));
            exited = true;
        }

        if !is_polygon && exited {
            push_slice(&mut slices, std::mem::take(&mut slice), is_polygon);
        }
    }

    if let Some(last) = line.last() {
        let a = last.axis(axis);
        if a >= k1 && a <= k2 {
            slice.push(*last);
        }
    }

    if is_polygon && slice.len() >= 2 {
        let first = slice[0];
        let end = slice[slice.len() - 1];
        if first.x != end.x || first.y != end.y {
            slice.push(first);
        }
    }

    push_slice(&mut slices, slice, is_polygon);
    slices
}

fn push_slice(slices: &mut Vec<Line>, slice: Line, is_polygon: bool) {
    let min_len = if is_polygon { 4 } else { 2 };
    if slice.len() >= min_len {
        slices.push(slice);
    }
}

fn intersect(a: &VectorPoint, b: &VectorPoint, k: f64, axis: Axis) -> VectorPoint {
    match axis {
        Axis::X => {
            let t = (k - a.x) / (b.x - a.x);
            VectorPoint::fixed(k, a.y + (b.y - a.y) * t)
        }
        Axis::Y => {
            let t = (k - a.y) / (b.y - a.y);
            VectorPoint::fixed(a.x + (b.x - a.x) * t, k)
        }
    }
}

/// Clips a line or ring to a rectangle, `x` first.
pub fn clip_line(line: &[VectorPoint], bbox: &BBox, is_polygon: bool) -> Vec<Line> {
    clip_line_axis(line, bbox.min_x, bbox.max_x, Axis::X, is_polygon)
        .iter()
        .flat_map(|piece| clip_line_axis(piece, bbox.min_y, bbox.max_y, Axis::Y, is_polygon))
        .collect()
}

/// Clips every feature to the band `[k1, k2] / scale` along `axis`.
///
/// `min_all` and `max_all` bound all features along the axis and allow the
/// whole set to be accepted or rejected without looking at any feature.
pub fn clip_features(
    features: &[Feature],
    scale: f64,
    k1: f64,
    k2: f64,
    axis: Axis,
    min_all: f64,
    max_all: f64,
) -> Vec<Feature> {
    let k1 = k1 / scale;
    let k2 = k2 / scale;

    if min_all >= k1 && max_all <= k2 {
        return features.to_vec();
    }
    if max_all < k1 || min_all > k2 {
        return Vec::new();
    }

    features
        .iter()
        .filter_map(|feature| {
            let (min, max) = feature.bbox.range(axis);
            if min >= k1 && max <= k2 {
                return Some(feature.clone());
            }
            if max < k1 || min > k2 {
                return None;
            }
            clip_geometry(&feature.geometry, k1, k2, axis).map(|g| feature.with_geometry(g))
        })
        .collect()
}

fn clip_geometry(geometry: &Geometry, k1: f64, k2: f64, axis: Axis) -> Option<Geometry> {
    let inside = |p: &VectorPoint| {
        let a = p.axis(axis);
        a >= k1 && a <= k2
    };

    match geometry {
        Geometry::Point(p) => inside(p).then_some(Geometry::Point(*p)),
        Geometry::MultiPoint(points) => {
            let kept: Vec<VectorPoint> = points.iter().copied().filter(|p| inside(p)).collect();
            (!kept.is_empty()).then_some(Geometry::MultiPoint(kept))
        }
        Geometry::LineString(line) => lines_to_geometry(clip_line_axis(line, k1, k2, axis, false)),
        Geometry::MultiLineString(lines) => lines_to_geometry(
            lines
                .iter()
                .flat_map(|line| clip_line_axis(line, k1, k2, axis, false))
                .collect(),
        ),
        Geometry::Polygon(rings) => clip_polygon(rings, k1, k2, axis).map(Geometry::Polygon),
        Geometry::MultiPolygon(polygons) => {
            let kept: Vec<Vec<Line>> = polygons
                .iter()
                .filter_map(|rings| clip_polygon(rings, k1, k2, axis))
                .collect();
            (!kept.is_empty()).then_some(Geometry::MultiPolygon(kept))
        }
    }
}

fn lines_to_geometry(mut lines: Vec<Line>) -> Option<Geometry> {
    match lines.len() {
        0 => None,
        1 => lines.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(lines)),
    }
}

/// Clips each ring; the polygon disappears with its outer ring.
fn clip_polygon(rings: &[Line], k1: f64, k2: f64, axis: Axis) -> Option<Vec<Line>> {
    let mut clipped = Vec::with_capacity(rings.len());
    for (index, ring) in rings.iter().enumerate() {
        match clip_line_axis(ring, k1, k2, axis, true).into_iter().next() {
            Some(ring) => clipped.push(ring),
            None if index == 0 => return None,
            None => {}
        }
    }
    Some(clipped)
}

/// Splits the features of tile `(zoom, i, j)` among its four children.
///
/// `buffer` is the overlap kept around each child as a fraction of the
/// child's width. Children come back in `(2i, 2j)`, `(2i+1, 2j)`,
/// `(2i, 2j+1)`, `(2i+1, 2j+1)` order.
pub fn split_into_children(
    features: &[Feature],
    zoom: u8,
    i: u32,
    j: u32,
    buffer: f64,
    bbox: &BBox,
) -> [Vec<Feature>; 4] {
    let scale = (1u64 << zoom) as f64;
    let (i, j) = (i as f64, j as f64);

    // band edges in parent tile units
    let k1 = 0.5 * buffer;
    let k2 = 0.5 - k1;
    let k3 = 0.5 + k1;
    let k4 = 1.0 + k1;

    let left = clip_features(features, scale, i - k1, i + k3, Axis::X, bbox.min_x, bbox.max_x);
    let right = clip_features(features, scale, i + k2, i + k4, Axis::X, bbox.min_x, bbox.max_x);

    let split_y = |half: &[Feature]| -> (Vec<Feature>, Vec<Feature>) {
        if half.is_empty() {
            return (Vec::new(), Vec::new());
        }
        (
            clip_features(half, scale, j - k1, j + k3, Axis::Y, bbox.min_y, bbox.max_y),
            clip_features(half, scale, j + k2, j + k4, Axis::Y, bbox.min_y, bbox.max_y),
        )
    };

    let (left_low, left_high) = split_y(&left);
    let (right_low, right_high) = split_y(&right);
    [left_low, right_low, left_high, right_high]
}
