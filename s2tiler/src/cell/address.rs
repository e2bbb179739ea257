//! Textual tile addresses.
//!
//! Accepted forms:
//!
//! - `s2/<face>/<zoom>/<i>/<j>`
//! - `wm/<zoom>/<x>/<y>`
//! - a decimal id, read under the caller's default projection
//! - a `0x`-prefixed hex id, likewise

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::error::CellError;
use super::projection::Projection;
use crate::coord::Face;

/// A tile position under a given projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub projection: Projection,
    pub face: Face,
    pub zoom: u8,
    pub i: u32,
    pub j: u32,
}

impl TileAddress {
    /// Creates an address, checking the zoom and position against the projection.
    pub fn new(projection: Projection, face: Face, zoom: u8, i: u32, j: u32) -> Result<Self, CellError> {
        let max = projection.max_zoom();
        if zoom > max {
            return Err(CellError::InvalidZoom { zoom, max });
        }
        let n = 1u64 << zoom;
        if i as u64 >= n || j as u64 >= n {
            return Err(CellError::PositionOutOfRange { zoom, i, j });
        }
        if !projection.faces().contains(&face) {
            return Err(CellError::InvalidAddress(format!(
                "face {} under {} projection",
                face, projection
            )));
        }
        Ok(Self {
            projection,
            face,
            zoom,
            i,
            j,
        })
    }

    /// Decodes a raw tile id.
    pub fn from_id(projection: Projection, id: u64) -> Result<Self, CellError> {
        projection.validate(id)?;
        let (face, zoom, i, j) = projection.to_face_zoom_ij(id);
        Ok(Self {
            projection,
            face,
            zoom,
            i,
            j,
        })
    }

    /// The raw tile id, suitable for `TileIndex::get_tile`.
    pub fn id(&self) -> u64 {
        self.projection.tile_id(self.face, self.zoom, self.i, self.j)
    }

    /// Parses any of the accepted address forms.
    ///
    /// # Arguments
    ///
    /// * `text` - Address text
    /// * `default_projection` - Projection used for bare numeric ids
    ///
    /// # Errors
    ///
    /// Returns `CellError` if the text matches no form or names an invalid tile.
    pub fn parse(text: &str, default_projection: Projection) -> Result<Self, CellError> {
        let text = text.trim();
        let invalid = || CellError::InvalidAddress(text.to_string());

        if let Some(caps) = s2_pattern().captures(text) {
            let face: u8 = caps[1].parse().map_err(|_| invalid())?;
            let zoom: u8 = caps[2].parse().map_err(|_| invalid())?;
            let i: u32 = caps[3].parse().map_err(|_| invalid())?;
            let j: u32 = caps[4].parse().map_err(|_| invalid())?;
            return Self::new(Projection::S2, Face::new(face)?, zoom, i, j);
        }

        if let Some(caps) = wm_pattern().captures(text) {
            let zoom: u8 = caps[1].parse().map_err(|_| invalid())?;
            let x: u32 = caps[2].parse().map_err(|_| invalid())?;
            let y: u32 = caps[3].parse().map_err(|_| invalid())?;
            return Self::new(Projection::WebMercator, Face::ALL[0], zoom, x, y);
        }

        let raw = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16).map_err(|_| invalid())?
        } else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse::<u64>().map_err(|_| invalid())?
        } else {
            return Err(invalid());
        };
        Self::from_id(default_projection, raw)
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.projection {
            Projection::S2 => write!(f, "s2/{}/{}/{}/{}", self.face, self.zoom, self.i, self.j),
            Projection::WebMercator => write!(f, "wm/{}/{}/{}", self.zoom, self.i, self.j),
        }
    }
}

fn s2_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // s2/<face digit>/<zoom>/<i>/<j>
        Regex::new(r"^(?i:s2)/(\d)/(\d{1,2})/(\d{1,10})/(\d{1,10})$").unwrap()
    })
}

fn wm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?i:wm)/(\d{1,2})/(\d{1,10})/(\d{1,10})$").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellId, MercatorTileId};

    #[test]
    fn test_parse_s2_address() {
        let addr = TileAddress::parse("s2/3/4/5/9", Projection::S2).unwrap();
        assert_eq!(addr.face, Face::ALL[3]);
        assert_eq!((addr.zoom, addr.i, addr.j), (4, 5, 9));
        assert_eq!(addr.id(), CellId::from_face_zoom_ij(Face::ALL[3], 4, 5, 9).raw());
        assert_eq!(addr.to_string(), "s2/3/4/5/9");
    }

    #[test]
    fn test_parse_wm_address() {
        let addr = TileAddress::parse("WM/3/5/2", Projection::S2).unwrap();
        assert_eq!(addr.projection, Projection::WebMercator);
        assert_eq!(addr.id(), MercatorTileId::new(3, 5, 2).unwrap().raw());
    }

    #[test]
    fn test_parse_raw_ids() {
        let id = CellId::from_face(Face::ALL[1]).child(2);
        let decimal = TileAddress::parse(&id.raw().to_string(), Projection::S2).unwrap();
        assert_eq!(decimal.id(), id.raw());
        let hex = TileAddress::parse(&format!("{:#x}", id.raw()), Projection::S2).unwrap();
        assert_eq!(hex, decimal);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for text in ["", "s2/6/0/0/0", "s2/0/2/4/0", "wm/30/0/0", "tile", "0", "s2/0/1/0"] {
            assert!(
                TileAddress::parse(text, Projection::S2).is_err(),
                "'{}' should be rejected",
                text
            );
        }
    }
}
