//! Web Mercator tile ids packed into the same 64-bit shape as cell ids.
//!
//! `id = ((2^zoom * y + x) * 32) + zoom`: the low 5 bits hold the zoom and
//! the rest the row-major tile index at that zoom.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::CellError;

/// Deepest zoom whose tile index still fits above the 5 zoom bits.
pub const MAX_MERCATOR_ZOOM: u8 = 29;

const ZOOM_BITS: u32 = 5;
const ZOOM_MASK: u64 = (1 << ZOOM_BITS) - 1;

/// A Web Mercator tile (`zoom/x/y`, `y` growing southward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct MercatorTileId(u64);

impl MercatorTileId {
    /// Creates a tile id, validating the zoom and position.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CellError> {
        if zoom > MAX_MERCATOR_ZOOM {
            return Err(CellError::InvalidZoom {
                zoom,
                max: MAX_MERCATOR_ZOOM,
            });
        }
        let n = 1u64 << zoom;
        if x as u64 >= n || y as u64 >= n {
            return Err(CellError::PositionOutOfRange { zoom, i: x, j: y });
        }
        Ok(Self::from_parts(zoom, x, y))
    }

    pub(crate) fn from_parts(zoom: u8, x: u32, y: u32) -> Self {
        let index = (1u64 << zoom) * y as u64 + x as u64;
        MercatorTileId((index << ZOOM_BITS) + zoom as u64)
    }

    /// Wraps a raw value without validation.
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        MercatorTileId(id)
    }

    pub fn try_from_raw(id: u64) -> Result<Self, CellError> {
        let zoom = (id & ZOOM_MASK) as u8;
        if zoom > MAX_MERCATOR_ZOOM || (id >> ZOOM_BITS) >= 1u64 << (2 * zoom as u32) {
            return Err(CellError::InvalidCellId(id));
        }
        Ok(MercatorTileId(id))
    }

    /// The single zoom-0 tile covering the world.
    pub const fn root() -> Self {
        MercatorTileId(0)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn zoom(self) -> u8 {
        (self.0 & ZOOM_MASK) as u8
    }

    pub fn to_zoom_xy(self) -> (u8, u32, u32) {
        let zoom = self.zoom();
        let index = self.0 >> ZOOM_BITS;
        let n = 1u64 << zoom;
        (zoom, (index % n) as u32, (index / n) as u32)
    }

    pub fn parent(self) -> Option<Self> {
        let (zoom, x, y) = self.to_zoom_xy();
        if zoom == 0 {
            return None;
        }
        Some(Self::from_parts(zoom - 1, x >> 1, y >> 1))
    }

    /// Children in `(x, y)` order: `(2x, 2y)`, `(2x+1, 2y)`, `(2x, 2y+1)`, `(2x+1, 2y+1)`.
    pub fn children(self) -> [Self; 4] {
        let (zoom, x, y) = self.to_zoom_xy();
        assert!(zoom < MAX_MERCATOR_ZOOM, "tile at zoom {} has no children", zoom);
        let (z, x, y) = (zoom + 1, x << 1, y << 1);
        [
            Self::from_parts(z, x, y),
            Self::from_parts(z, x + 1, y),
            Self::from_parts(z, x, y + 1),
            Self::from_parts(z, x + 1, y + 1),
        ]
    }

    /// True if `other` is this tile or one of its descendants.
    pub fn contains(self, other: Self) -> bool {
        let (zoom, x, y) = self.to_zoom_xy();
        let (other_zoom, ox, oy) = other.to_zoom_xy();
        if other_zoom < zoom {
            return false;
        }
        let shift = other_zoom - zoom;
        ox >> shift == x && oy >> shift == y
    }
}

impl From<MercatorTileId> for u64 {
    fn from(id: MercatorTileId) -> Self {
        id.0
    }
}

impl TryFrom<u64> for MercatorTileId {
    type Error = CellError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        MercatorTileId::try_from_raw(value)
    }
}

impl fmt::Display for MercatorTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (zoom, x, y) = self.to_zoom_xy();
        write!(f, "{}/{}/{}", zoom, x, y)
    }
}
