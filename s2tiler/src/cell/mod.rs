//! Hierarchical cell identifiers.
//!
//! [`CellId`] encodes a face, a Hilbert curve position and a level in one
//! `u64`. Web Mercator tiles get the same treatment through
//! [`MercatorTileId`], and [`Projection`] dispatches between the two for
//! code that only handles raw ids.

mod address;
mod error;
mod id;
mod lookup;
mod mercator;
mod neighbors;
mod projection;

pub use address::TileAddress;
pub use error::CellError;
pub use id::{lsb_for_level, size_ij, size_st, CellId, FACE_BITS, POS_BITS, WRAP_OFFSET};
pub use mercator::{MercatorTileId, MAX_MERCATOR_ZOOM};
pub use projection::Projection;
