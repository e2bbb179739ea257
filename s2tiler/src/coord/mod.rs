//! Coordinate conversion module
//!
//! Pure conversions between the coordinate spaces used to address the
//! cube-projected sphere:
//!
//! - geographic longitude/latitude (degrees)
//! - unit-sphere XYZ
//! - per-face UV (planar, `[-1, 1]`)
//! - per-face ST (quadratically warped UV, `[0, 1]`)
//! - per-face IJ (integer grid, `[0, 2^30)`)
//!
//! Every pair is an inverse up to floating point rounding. Out-of-range
//! inputs (latitudes past the poles, ST outside the face) are clamped rather
//! than rejected.

mod mercator;
mod types;

pub use mercator::{
    lon_lat_to_unit, project_x, project_y, unit_to_lon_lat, unproject_x, unproject_y,
};
pub use types::{CoordError, Face, LonLat, Point3, LIMIT_IJ, MAX_LAT, MAX_LEVEL, MIN_LAT, NUM_FACES};

/// Converts an ST coordinate to UV using the quadratic projection.
///
/// The quadratic warp keeps cell areas closer to uniform than a linear map.
#[inline]
pub fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// Converts a UV coordinate back to ST. Inverse of [`st_to_uv`].
#[inline]
pub fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Converts an ST coordinate to the leaf IJ grid, clamped to `[0, 2^30 - 1]`.
#[inline]
pub fn st_to_ij(s: f64) -> u32 {
    let scaled = (s * LIMIT_IJ as f64).floor();
    // NaN casts to 0, which is also the clamp floor
    scaled.clamp(0.0, (LIMIT_IJ - 1) as f64) as u32
}

/// Converts a leaf IJ grid coordinate to ST (the cell's low edge).
#[inline]
pub fn ij_to_st(i: u32) -> f64 {
    i as f64 / LIMIT_IJ as f64
}

/// Maps face-local UV to an (unnormalized) point on the cube.
///
/// # Arguments
///
/// * `face` - Cube face
/// * `u` - Planar coordinate along the face's first axis
/// * `v` - Planar coordinate along the face's second axis
pub fn face_uv_to_xyz(face: Face, u: f64, v: f64) -> Point3 {
    match face.value() {
        0 => Point3::new(1.0, u, v),
        1 => Point3::new(-u, 1.0, v),
        2 => Point3::new(-u, -v, 1.0),
        3 => Point3::new(-1.0, -v, -u),
        4 => Point3::new(v, -1.0, -u),
        _ => Point3::new(v, u, -1.0),
    }
}

/// Projects a point onto the plane of `face`, returning its UV coordinates.
///
/// The point does not need to lie on that face; the result is then outside
/// `[-1, 1]`, which neighbor lookups across face seams rely on.
pub fn face_xyz_to_uv(face: Face, p: &Point3) -> (f64, f64) {
    match face.value() {
        0 => (p.y / p.x, p.z / p.x),
        1 => (-p.x / p.y, p.z / p.y),
        2 => (-p.x / p.z, -p.y / p.z),
        3 => (p.z / p.x, p.y / p.x),
        4 => (p.z / p.y, -p.x / p.y),
        _ => (-p.y / p.z, -p.x / p.z),
    }
}

/// Returns the face whose axis has the largest component of `p`.
pub fn xyz_to_face(p: &Point3) -> Face {
    let axis = p.largest_abs_component();
    let face = if p.axis(axis) < 0.0 { axis + 3 } else { axis };
    Face::from_bits(face as u8)
}

/// Converts a point to its face and face-local UV coordinates.
pub fn xyz_to_face_uv(p: &Point3) -> (Face, f64, f64) {
    let face = xyz_to_face(p);
    let (u, v) = face_xyz_to_uv(face, p);
    (face, u, v)
}

/// Converts a point to its face and face-local ST coordinates.
pub fn xyz_to_face_st(p: &Point3) -> (Face, f64, f64) {
    let (face, u, v) = xyz_to_face_uv(p);
    (face, uv_to_st(u), uv_to_st(v))
}

/// Converts face-local ST coordinates to a unit-sphere point.
pub fn face_st_to_xyz(face: Face, s: f64, t: f64) -> Point3 {
    face_uv_to_xyz(face, st_to_uv(s), st_to_uv(t)).normalize()
}

/// Converts a geographic position to a unit-sphere point.
///
/// Latitude is clamped to the poles; longitude may be any value.
pub fn lon_lat_to_xyz(ll: LonLat) -> Point3 {
    let lat = ll.lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    let lon = ll.lon.to_radians();
    let cos_lat = lat.cos();
    Point3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

/// Converts a point on (or near) the sphere to longitude/latitude in degrees.
pub fn xyz_to_lon_lat(p: &Point3) -> LonLat {
    let lon = p.y.atan2(p.x).to_degrees();
    let lat = p.z.atan2((p.x * p.x + p.y * p.y).sqrt()).to_degrees();
    LonLat::new(lon, lat)
}

/// Converts a geographic position straight to its face and ST coordinates.
pub fn lon_lat_to_face_st(ll: LonLat) -> (Face, f64, f64) {
    xyz_to_face_st(&lon_lat_to_xyz(ll))
}

/// Converts face-local ST coordinates to longitude/latitude.
pub fn face_st_to_lon_lat(face: Face, s: f64, t: f64) -> LonLat {
    xyz_to_lon_lat(&face_st_to_xyz(face, s, t))
}
