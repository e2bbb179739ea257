//! Tile index errors.

use thiserror::Error;

use super::config::ConfigError;
use crate::geometry::InputError;

/// Errors raised while building a [`TileIndex`](super::TileIndex).
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid index configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Index build cancelled")]
    Cancelled,
}
