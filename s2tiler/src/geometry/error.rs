//! Input errors.

use thiserror::Error;

use crate::coord::CoordError;

/// Errors raised while reading or projecting source features.
///
/// Any error aborts the whole collection; nothing is partially ingested.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed feature JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feature {feature}: position has {len} numbers, expected 2 or 3")]
    InvalidPosition { feature: usize, len: usize },

    #[error("Feature {feature}: coordinate is not a finite number")]
    NonFiniteCoordinate { feature: usize },

    #[error("Feature {feature}: {kind} has no positions")]
    EmptyGeometry { feature: usize, kind: &'static str },

    #[error("Feature {feature}: {source}")]
    InvalidFace {
        feature: usize,
        #[source]
        source: CoordError,
    },
}
