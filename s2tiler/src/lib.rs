//! s2tiler - S2 cell ids and on-demand vector tiling on the sphere
//!
//! The library has two halves:
//!
//! - [`coord`] and [`cell`]: conversions between lon/lat, unit vectors and
//!   face-local coordinates, and the 64-bit S2 cell id with its Hilbert-curve
//!   hierarchy, neighbors and textual forms.
//! - [`geometry`], [`tile`] and [`index`]: projection of lon/lat or face-local
//!   features onto cube faces, then a quadtree of clipped, simplified tiles
//!   built eagerly to a shallow depth and refined lazily on request.
//!
//! Tiles can be addressed on the S2 cube (six faces, cell ids) or in a single
//! Web Mercator square, see [`cell::Projection`].
//!
//! # Example
//!
//! ```
//! use s2tiler::{CellId, LonLat, SourceCollection, TileIndex, TileIndexConfig};
//!
//! let json = r#"{
//!     "type": "FeatureCollection",
//!     "features": [{
//!         "type": "Feature",
//!         "properties": { "name": "null island" },
//!         "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
//!     }]
//! }"#;
//!
//! let collection = SourceCollection::from_json_str(json)?;
//! let mut index = TileIndex::new(&collection, TileIndexConfig::default())?;
//!
//! // The cell at zoom 6 that holds the point
//! let cell = CellId::from_lon_lat(LonLat::new(0.0, 0.0)).parent_at(6);
//! let tile = index.get_tile(cell).expect("tile with one feature");
//! assert_eq!(tile.num_features(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cell;
pub mod config;
pub mod coord;
pub mod geometry;
pub mod index;
pub mod logging;
pub mod tile;

pub use cell::{CellError, CellId, MercatorTileId, Projection, TileAddress};
pub use coord::{Face, LonLat};
pub use geometry::{InputError, SourceCollection, SourceFeature};
pub use index::{IndexError, IndexStats, TileIndex, TileIndexConfig};
pub use tile::VectorTile;
