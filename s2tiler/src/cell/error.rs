//! Cell and tile address errors.

use thiserror::Error;

use crate::coord::CoordError;

/// Errors raised when turning untrusted input into cell or tile ids.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    /// The value has no valid face or level sentinel
    #[error("Invalid cell id: {0:#018x}")]
    InvalidCellId(u64),

    /// The token is not a hex cell id
    #[error("Invalid cell token: '{0}'")]
    InvalidToken(String),

    /// Level above the leaf level
    #[error("Invalid level: {0} (must be 0-30)")]
    InvalidLevel(u8),

    /// Zoom outside what the tile scheme can address
    #[error("Invalid zoom: {zoom} (must be 0-{max})")]
    InvalidZoom { zoom: u8, max: u8 },

    /// Tile column/row outside the grid at its zoom
    #[error("Tile position {i}/{j} out of range at zoom {zoom}")]
    PositionOutOfRange { zoom: u8, i: u32, j: u32 },

    #[error(transparent)]
    Coord(#[from] CoordError),

    /// Unrecognized tile address text
    #[error("Invalid tile address '{0}': expected s2/<face>/<zoom>/<i>/<j>, wm/<zoom>/<x>/<y>, a decimal id or a hex token")]
    InvalidAddress(String),
}
