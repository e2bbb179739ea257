//! Tile scheme selection.
//!
//! The tile index stores raw `u64` ids; [`Projection`] says how to read them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CellError;
use super::id::CellId;
use super::mercator::{MercatorTileId, MAX_MERCATOR_ZOOM};
use crate::coord::{Face, MAX_LEVEL};

static S2_FACES: [Face; 6] = Face::ALL;
static MERCATOR_FACES: [Face; 1] = [Face::ALL[0]];

/// Tiling scheme used to address tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Projection {
    /// Six cube faces, tiles addressed by [`CellId`]
    #[default]
    #[serde(rename = "s2")]
    S2,
    /// One square world, tiles addressed by [`MercatorTileId`]
    #[serde(rename = "wm")]
    WebMercator,
}

impl Projection {
    /// Faces that can hold data under this scheme.
    pub fn faces(self) -> &'static [Face] {
        match self {
            Projection::S2 => &S2_FACES,
            Projection::WebMercator => &MERCATOR_FACES,
        }
    }

    /// Deepest zoom the id encoding can address.
    pub fn max_zoom(self) -> u8 {
        match self {
            Projection::S2 => MAX_LEVEL,
            Projection::WebMercator => MAX_MERCATOR_ZOOM,
        }
    }

    /// Checks that `id` is well formed under this scheme.
    pub fn validate(self, id: u64) -> Result<(), CellError> {
        match self {
            Projection::S2 => CellId::try_from_raw(id).map(|_| ()),
            Projection::WebMercator => MercatorTileId::try_from_raw(id).map(|_| ()),
        }
    }

    /// Id of the zoom-0 tile on `face`.
    pub fn root(self, face: Face) -> u64 {
        match self {
            Projection::S2 => CellId::from_face(face).raw(),
            Projection::WebMercator => MercatorTileId::root().raw(),
        }
    }

    /// Id of the tile at `(face, zoom, i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the grid at `zoom`.
    pub fn tile_id(self, face: Face, zoom: u8, i: u32, j: u32) -> u64 {
        match self {
            Projection::S2 => CellId::from_face_zoom_ij(face, zoom, i, j).raw(),
            Projection::WebMercator => {
                assert!(
                    zoom <= MAX_MERCATOR_ZOOM
                        && (i as u64) < (1u64 << zoom)
                        && (j as u64) < (1u64 << zoom),
                    "tile {}/{}/{} out of range",
                    zoom,
                    i,
                    j
                );
                MercatorTileId::from_parts(zoom, i, j).raw()
            }
        }
    }

    pub fn zoom(self, id: u64) -> u8 {
        match self {
            Projection::S2 => CellId::from_raw(id).level(),
            Projection::WebMercator => MercatorTileId::from_raw(id).zoom(),
        }
    }

    /// Face, zoom and tile position of `id`.
    pub fn to_face_zoom_ij(self, id: u64) -> (Face, u8, u32, u32) {
        match self {
            Projection::S2 => CellId::from_raw(id).to_face_zoom_ij(),
            Projection::WebMercator => {
                let (zoom, x, y) = MercatorTileId::from_raw(id).to_zoom_xy();
                (Face::ALL[0], zoom, x, y)
            }
        }
    }

    /// Parent tile id, `None` at zoom 0.
    pub fn parent(self, id: u64) -> Option<u64> {
        match self {
            Projection::S2 => CellId::from_raw(id).parent().map(CellId::raw),
            Projection::WebMercator => MercatorTileId::from_raw(id).parent().map(MercatorTileId::raw),
        }
    }

    /// True if `descendant` is `ancestor` or lies below it.
    pub fn contains(self, ancestor: u64, descendant: u64) -> bool {
        match self {
            Projection::S2 => CellId::from_raw(ancestor).contains(CellId::from_raw(descendant)),
            Projection::WebMercator => {
                MercatorTileId::from_raw(ancestor).contains(MercatorTileId::from_raw(descendant))
            }
        }
    }

    /// Ids of the four children of `(face, zoom, i, j)`, ordered by position:
    /// `(2i, 2j)`, `(2i+1, 2j)`, `(2i, 2j+1)`, `(2i+1, 2j+1)`.
    pub fn children_ij(self, face: Face, zoom: u8, i: u32, j: u32) -> [u64; 4] {
        let (z, i, j) = (zoom + 1, i << 1, j << 1);
        [
            self.tile_id(face, z, i, j),
            self.tile_id(face, z, i + 1, j),
            self.tile_id(face, z, i, j + 1),
            self.tile_id(face, z, i + 1, j + 1),
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Projection::S2 => "s2",
            Projection::WebMercator => "wm",
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Projection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s2" => Ok(Projection::S2),
            "wm" | "webmercator" | "web_mercator" => Ok(Projection::WebMercator),
            other => Err(format!("unknown projection '{}', expected 's2' or 'wm'", other)),
        }
    }
}
