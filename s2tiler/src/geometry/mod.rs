//! Feature geometry: input parsing, face projection, simplification and clipping.
//!
//! Source features ([`SourceCollection`]) are projected by a
//! [`GeometryProjector`] into face-local [`Feature`]s with coordinates in
//! `[0, 1]` on their face. The tile index then cuts those features into
//! tiles with [`split_into_children`].

mod clip;
mod error;
mod input;
mod project;
mod simplify;
mod types;

pub use clip::{clip_features, clip_line, clip_line_axis, split_into_children};
pub use error::InputError;
pub use input::{CoordinateSpace, GeometryInput, Position, SourceCollection, SourceFeature};
pub use project::{GeometryProjector, SEAM_BUFFER};
pub use simplify::{build_sq_dists, line_length, rewind, signed_area, sq_seg_dist};
pub use types::{Axis, BBox, Feature, Geometry, Line, Properties, VectorPoint};
