//! 64-bit hierarchical cell identifiers.
//!
//! Layout, most significant bit first:
//!
//! ```text
//! fff ppppp...pppp 1 000...0
//! |   |            | |
//! |   |            | +- zero padding below the sentinel
//! |   |            +--- sentinel: its position encodes the level
//! |   +---------------- 2 bits of Hilbert position per level
//! +-------------------- face (0-5)
//! ```
//!
//! A leaf (level 30) has the sentinel at bit 0. Ids sort along the Hilbert
//! curve, so a cell's descendants occupy one contiguous id range.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::CellError;
use super::lookup::{tables, INVERT_MASK, LOOKUP_BITS, SWAP_MASK};
use crate::coord::{
    self, Face, LonLat, Point3, LIMIT_IJ, MAX_LEVEL, NUM_FACES,
};

/// Bits used for the face number.
pub const FACE_BITS: u32 = 3;

/// Bits below the face: 2 per level plus the leaf sentinel.
pub const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// Size of the id space across all faces; `next`/`prev` wrap modulo this.
pub const WRAP_OFFSET: u64 = (NUM_FACES as u64) << POS_BITS;

const LOOKUP_MASK: u32 = (1 << LOOKUP_BITS) - 1;

/// Chunks of `LOOKUP_BITS` needed to cover a leaf coordinate.
const LOOKUP_STEPS: u32 = 8;

/// Sentinel positions at which the decoded orientation is swapped.
const ORIENTATION_FLIP_MASK: u64 = 0x1111_1111_1111_1110;

/// Every even bit a sentinel may occupy.
const SENTINEL_MASK: u64 = 0x1555_5555_5555_5555;

/// Lowest set bit of a cell at `level`.
#[inline]
pub const fn lsb_for_level(level: u8) -> u64 {
    1u64 << (2 * (MAX_LEVEL - level) as u32)
}

/// Edge length of a cell at `level`, in leaf IJ units.
#[inline]
pub const fn size_ij(level: u8) -> u32 {
    1u32 << (MAX_LEVEL - level)
}

/// Edge length of a cell at `level`, in ST units.
#[inline]
pub fn size_st(level: u8) -> f64 {
    coord::ij_to_st(size_ij(level))
}

/// A cell on the cube-projected sphere, from a whole face down to a leaf.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CellId(u64);

impl CellId {
    /// Wraps a raw value without validating it.
    ///
    /// Use [`CellId::try_from_raw`] for values from outside the process.
    /// Hierarchy operations on an invalid id panic.
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        CellId(id)
    }

    /// Wraps a raw value, rejecting ids without a valid face and sentinel.
    pub fn try_from_raw(id: u64) -> Result<Self, CellError> {
        let cell = CellId(id);
        if cell.is_valid() {
            Ok(cell)
        } else {
            Err(CellError::InvalidCellId(id))
        }
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// True if the face is 0-5 and the sentinel sits on an even bit.
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 >> POS_BITS) < NUM_FACES as u64 && (self.lsb() & SENTINEL_MASK) != 0
    }

    /// Panics unless the id has a valid face and sentinel.
    #[inline]
    #[track_caller]
    fn assert_valid(self) {
        assert!(
            self.is_valid(),
            "invalid cell id {:#018x}: no level sentinel",
            self.0
        );
    }

    /// The level-0 cell covering a whole face.
    pub fn from_face(face: Face) -> Self {
        CellId(((face.value() as u64) << POS_BITS) + lsb_for_level(0))
    }

    /// Cell at `level` containing the Hilbert position `pos` on `face`.
    pub fn from_face_pos_level(face: Face, pos: u64, level: u8) -> Self {
        CellId(((face.value() as u64) << POS_BITS) + (pos | 1)).parent_at(level)
    }

    /// Encodes a leaf cell from face-local IJ coordinates.
    ///
    /// Coordinates past the grid are clamped to the last row/column.
    pub fn from_face_ij(face: Face, i: u32, j: u32) -> Self {
        let (i, j) = (i.min(LIMIT_IJ - 1), j.min(LIMIT_IJ - 1));
        let lookup = tables();
        let mut n: u64 = (face.value() as u64) << (POS_BITS - 1);
        let mut bits = face.orientation() as usize;

        for k in (0..LOOKUP_STEPS).rev() {
            let shift = k * LOOKUP_BITS;
            bits += (((i >> shift) & LOOKUP_MASK) as usize) << (LOOKUP_BITS + 2);
            bits += (((j >> shift) & LOOKUP_MASK) as usize) << 2;
            bits = lookup.pos[bits] as usize;
            n |= ((bits >> 2) as u64) << (2 * shift);
            bits &= SWAP_MASK | INVERT_MASK;
        }

        CellId(n * 2 + 1)
    }

    /// Encodes the cell at `zoom` whose IJ position at that zoom is `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `zoom > 30` or `i`/`j` fall outside `[0, 2^zoom)`.
    pub fn from_face_zoom_ij(face: Face, zoom: u8, i: u32, j: u32) -> Self {
        assert!(zoom <= MAX_LEVEL, "zoom {} above leaf level", zoom);
        let shift = (MAX_LEVEL - zoom) as u32;
        assert!(
            (i as u64) < (1u64 << zoom) && (j as u64) < (1u64 << zoom),
            "position {}/{} out of range at zoom {}",
            i,
            j,
            zoom
        );
        Self::from_face_ij(face, i << shift, j << shift).parent_at(zoom)
    }

    /// Leaf cell containing face-local ST coordinates.
    pub fn from_face_st(face: Face, s: f64, t: f64) -> Self {
        Self::from_face_ij(face, coord::st_to_ij(s), coord::st_to_ij(t))
    }

    /// Leaf cell containing a point on the sphere.
    pub fn from_point(p: &Point3) -> Self {
        let (face, s, t) = coord::xyz_to_face_st(p);
        Self::from_face_st(face, s, t)
    }

    /// Leaf cell containing a geographic position.
    pub fn from_lon_lat(ll: LonLat) -> Self {
        Self::from_point(&coord::lon_lat_to_xyz(ll))
    }

    /// First cell at `level` along the curve (on face 0).
    pub fn first_at_level(level: u8) -> Self {
        Self::from_face(Face::ALL[0]).child_begin_at(level)
    }

    /// Last cell at `level` along the curve (on face 5).
    pub fn last_at_level(level: u8) -> Self {
        Self::from_face_pos_level(Face::ALL[5], u64::MAX >> FACE_BITS, level)
    }

    #[inline]
    pub fn face(self) -> Face {
        Face::from_bits((self.0 >> POS_BITS) as u8)
    }

    /// Hilbert position on the face, sentinel included.
    #[inline]
    pub const fn pos(self) -> u64 {
        self.0 & (u64::MAX >> FACE_BITS)
    }

    /// Lowest set bit (the sentinel).
    #[inline]
    pub const fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Subdivision level, 0 (face) to 30 (leaf).
    ///
    /// # Panics
    ///
    /// Panics on an id without a valid sentinel.
    pub fn level(self) -> u8 {
        self.assert_valid();
        MAX_LEVEL - (self.0.trailing_zeros() / 2) as u8
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.assert_valid();
        self.0 & 1 != 0
    }

    #[inline]
    pub fn is_face(self) -> bool {
        self.assert_valid();
        self.0 & (lsb_for_level(0) - 1) == 0
    }

    /// The cell one level up, or `None` for a face cell.
    pub fn parent(self) -> Option<Self> {
        if self.is_face() {
            return None;
        }
        let new_lsb = self.lsb() << 2;
        Some(CellId((self.0 & new_lsb.wrapping_neg()) | new_lsb))
    }

    /// The ancestor at `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level` is deeper than this cell.
    pub fn parent_at(self, level: u8) -> Self {
        assert!(
            level <= self.level(),
            "parent level {} below cell level {}",
            level,
            self.level()
        );
        let new_lsb = lsb_for_level(level);
        CellId((self.0 & new_lsb.wrapping_neg()) | new_lsb)
    }

    /// Child at Hilbert position `position` (0-3).
    ///
    /// # Panics
    ///
    /// Panics on an invalid or leaf cell, or a position above 3.
    pub fn child(self, position: u8) -> Self {
        assert!(!self.is_leaf(), "leaf cell {:#018x} has no children", self.0);
        assert!(position < 4, "child position {} out of range", position);
        let new_lsb = (self.lsb() >> 2) as i64;
        let offset = (2 * position as i64 - 3) * new_lsb;
        CellId(self.0.wrapping_add(offset as u64))
    }

    /// The four children. Sibling order depends on the face orientation so
    /// that consecutive entries stay adjacent on the curve.
    pub fn children(self) -> [Self; 4] {
        let mut children = [self.child(0), self.child(3), self.child(2), self.child(1)];
        if self.face().orientation() == 0 {
            children.swap(1, 3);
        }
        children
    }

    /// Hilbert position (0-3) of this cell's ancestor at `level` within its parent.
    pub fn child_position(self, level: u8) -> u8 {
        assert!(
            level >= 1 && level <= self.level(),
            "no child position at level {}",
            level
        );
        ((self.0 >> (2 * (MAX_LEVEL - level) as u32 + 1)) & 3) as u8
    }

    /// First child along the curve.
    pub fn child_begin(self) -> Self {
        self.assert_valid();
        let lsb = self.lsb();
        CellId(self.0 - lsb + (lsb >> 2))
    }

    /// First descendant at `level` along the curve.
    pub fn child_begin_at(self, level: u8) -> Self {
        self.assert_valid();
        CellId(self.0 - self.lsb() + lsb_for_level(level))
    }

    /// One past the last child along the curve (exclusive bound).
    pub fn child_end(self) -> Self {
        self.assert_valid();
        let lsb = self.lsb();
        CellId(self.0 + lsb + (lsb >> 2))
    }

    /// One past the last descendant at `level` (exclusive bound).
    pub fn child_end_at(self, level: u8) -> Self {
        self.assert_valid();
        CellId(self.0 + self.lsb() + lsb_for_level(level))
    }

    /// Smallest leaf id in this cell's subtree.
    #[inline]
    pub fn range_min(self) -> Self {
        self.assert_valid();
        CellId(self.0 - (self.lsb() - 1))
    }

    /// Largest leaf id in this cell's subtree.
    #[inline]
    pub fn range_max(self) -> Self {
        self.assert_valid();
        CellId(self.0 + (self.lsb() - 1))
    }

    /// Inclusive leaf id span of the subtree.
    pub fn range(self) -> (Self, Self) {
        (self.range_min(), self.range_max())
    }

    /// True if `other` lies in this cell's subtree (or is this cell).
    pub fn contains(self, other: Self) -> bool {
        other.assert_valid();
        other >= self.range_min() && other <= self.range_max()
    }

    pub fn intersects(self, other: Self) -> bool {
        other.range_min() <= self.range_max() && other.range_max() >= self.range_min()
    }

    /// Next cell at the same level along the curve, wrapping from the end of
    /// face 5 to the start of face 0.
    pub fn next(self) -> Self {
        self.assert_valid();
        let n = self.0.wrapping_add(self.lsb() << 1);
        if n < WRAP_OFFSET {
            CellId(n)
        } else {
            CellId(n.wrapping_sub(WRAP_OFFSET))
        }
    }

    /// Previous cell at the same level, wrapping from face 0 to face 5.
    pub fn prev(self) -> Self {
        self.assert_valid();
        let p = self.0.wrapping_sub(self.lsb() << 1);
        if p < WRAP_OFFSET {
            CellId(p)
        } else {
            CellId(p.wrapping_add(WRAP_OFFSET))
        }
    }

    /// Decodes the face, the leaf IJ at the cell's center and the curve
    /// orientation of the cell.
    pub fn to_face_ij_orientation(self) -> (Face, u32, u32, u8) {
        let face = self.face();
        let lookup = tables();
        let mut bits = face.orientation() as usize;
        let (mut i, mut j) = (0u32, 0u32);

        for k in (0..LOOKUP_STEPS).rev() {
            let shift = k * LOOKUP_BITS;
            // The top chunk only carries 2 bits per axis (30 = 7 * 4 + 2)
            let nbits = if k == LOOKUP_STEPS - 1 {
                MAX_LEVEL as u32 - (LOOKUP_STEPS - 1) * LOOKUP_BITS
            } else {
                LOOKUP_BITS
            };
            let chunk = (self.0 >> (2 * shift + 1)) & ((1u64 << (2 * nbits)) - 1);
            bits += (chunk as usize) << 2;
            bits = lookup.ij[bits] as usize;
            i += ((bits >> (LOOKUP_BITS + 2)) as u32) << shift;
            j += (((bits >> 2) as u32) & LOOKUP_MASK) << shift;
            bits &= SWAP_MASK | INVERT_MASK;
        }

        // Each "00" pair below the sentinel reverses the swap bit
        if self.lsb() & ORIENTATION_FLIP_MASK != 0 {
            bits ^= SWAP_MASK;
        }

        (face, i, j, bits as u8)
    }

    pub fn to_face_ij(self) -> (Face, u32, u32) {
        let (face, i, j, _) = self.to_face_ij_orientation();
        (face, i, j)
    }

    /// The cell's face, level and IJ position at its own level.
    pub fn to_face_zoom_ij(self) -> (Face, u8, u32, u32) {
        let level = self.level();
        let (face, i, j) = self.to_face_ij();
        let shift = (MAX_LEVEL - level) as u32;
        (face, level, i >> shift, j >> shift)
    }

    /// ST bounds as `[min_s, min_t, max_s, max_t]`.
    pub fn bounds_st(self) -> [f64; 4] {
        let (_, level, i, j) = self.to_face_zoom_ij();
        let size = size_st(level);
        let (s, t) = (i as f64 * size, j as f64 * size);
        [s, t, s + size, t + size]
    }

    pub fn center_st(self) -> (f64, f64) {
        let [min_s, min_t, max_s, max_t] = self.bounds_st();
        (0.5 * (min_s + max_s), 0.5 * (min_t + max_t))
    }

    /// Center of the cell on the unit sphere.
    pub fn to_point(self) -> Point3 {
        let (s, t) = self.center_st();
        coord::face_st_to_xyz(self.face(), s, t)
    }

    pub fn to_lon_lat(self) -> LonLat {
        coord::xyz_to_lon_lat(&self.to_point())
    }

    /// Compact hex form with trailing zeros removed (`"X"` for id 0).
    pub fn to_token(self) -> String {
        if self.0 == 0 {
            return "X".to_string();
        }
        let hex = format!("{:016x}", self.0);
        hex.trim_end_matches('0').to_string()
    }

    /// Parses a token produced by [`CellId::to_token`].
    pub fn from_token(token: &str) -> Result<Self, CellError> {
        let invalid = || CellError::InvalidToken(token.to_string());
        if token.is_empty() || token.len() > 16 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let raw = u64::from_str_radix(&format!("{:0<16}", token), 16).map_err(|_| invalid())?;
        Self::try_from_raw(raw)
    }
}

impl From<CellId> for u64 {
    fn from(id: CellId) -> Self {
        id.0
    }
}

impl TryFrom<u64> for CellId {
    type Error = CellError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        CellId::try_from_raw(value)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({:#018x})", self.0)
    }
}

/// Face followed by the child position at each level, e.g. `3/0213`.
impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "Invalid: {:#018x}", self.0);
        }
        write!(f, "{}/", self.face())?;
        for level in 1..=self.level() {
            write!(f, "{}", self.child_position(level))?;
        }
        Ok(())
    }
}
