//! Coordinate types and constants shared by the transform pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of cube faces.
pub const NUM_FACES: u8 = 6;

/// Deepest subdivision level of a face (leaf cells).
pub const MAX_LEVEL: u8 = 30;

/// Size of the integer IJ grid along one face edge at leaf resolution.
pub const LIMIT_IJ: u32 = 1 << MAX_LEVEL;

/// Minimum latitude accepted before clamping.
pub const MIN_LAT: f64 = -90.0;

/// Maximum latitude accepted before clamping.
pub const MAX_LAT: f64 = 90.0;

/// Coordinate errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid cube face: {0} (must be 0-5)")]
    InvalidFace(u8),
}

/// One of the six faces of the cube circumscribing the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Face(u8);

impl Face {
    /// All faces in id order.
    pub const ALL: [Face; 6] = [Face(0), Face(1), Face(2), Face(3), Face(4), Face(5)];

    /// Creates a face, rejecting values outside 0-5.
    pub fn new(value: u8) -> Result<Self, CoordError> {
        if value < NUM_FACES {
            Ok(Face(value))
        } else {
            Err(CoordError::InvalidFace(value))
        }
    }

    /// Reads a face from the top bits of a cell id.
    ///
    /// # Panics
    ///
    /// Panics if the bits do not name a face. Only corrupted ids can reach this.
    pub(crate) fn from_bits(bits: u8) -> Self {
        assert!(bits < NUM_FACES, "corrupted cell id: face bits {} out of range", bits);
        Face(bits)
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Hilbert curve orientation the face starts in (odd faces are swapped).
    #[inline]
    pub const fn orientation(self) -> u8 {
        self.0 & 1
    }
}

impl TryFrom<u8> for Face {
    type Error = CoordError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Face::new(value)
    }
}

impl From<Face> for u8 {
    fn from(face: Face) -> Self {
        face.0
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in 3D space, usually on (or near) the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Scales the point onto the unit sphere. The zero vector is returned as-is.
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            return *self;
        }
        Self::new(self.x / n, self.y / n, self.z / n)
    }

    /// Index of the component with the largest magnitude (0 = x, 1 = y, 2 = z).
    pub fn largest_abs_component(&self) -> usize {
        let (ax, ay, az) = (self.x.abs(), self.y.abs(), self.z.abs());
        if ax > ay {
            if ax > az {
                0
            } else {
                2
            }
        } else if ay > az {
            1
        } else {
            2
        }
    }

    pub(crate) fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.9}, {:.9})", self.lon, self.lat)
    }
}
