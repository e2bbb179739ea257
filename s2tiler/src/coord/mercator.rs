//! Web Mercator unit-square projection.
//!
//! Maps longitude/latitude onto `[0, 1]²` with `y` growing southward, the
//! layout used by Web Mercator tile pyramids.

use std::f64::consts::PI;

use super::types::LonLat;

/// Projects a longitude onto the unit square's x axis.
#[inline]
pub fn project_x(lon: f64) -> f64 {
    lon / 360.0 + 0.5
}

/// Projects a latitude onto the unit square's y axis, clamped to `[0, 1]`.
///
/// The poles map to the clamped edges instead of infinity.
#[inline]
pub fn project_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    if y.is_nan() {
        return 0.5;
    }
    y.clamp(0.0, 1.0)
}

#[inline]
pub fn unproject_x(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

#[inline]
pub fn unproject_y(y: f64) -> f64 {
    let y2 = 0.5 - y;
    (PI * y2 * 2.0).sinh().atan().to_degrees()
}

/// Projects a geographic position onto the Web Mercator unit square.
pub fn lon_lat_to_unit(ll: LonLat) -> (f64, f64) {
    (project_x(ll.lon), project_y(ll.lat))
}

/// Inverse of [`lon_lat_to_unit`] for points inside the unit square.
pub fn unit_to_lon_lat(x: f64, y: f64) -> LonLat {
    LonLat::new(unproject_x(x), unproject_y(y))
}
