//! Tile pyramid over projected features.
//!
//! [`TileIndex`] builds tiles top-down from each occupied face's root. The
//! eager build stops at `index_maxzoom` or once a tile holds few enough
//! points; such tiles keep their unclipped source features so that
//! [`TileIndex::get_tile`] can split further on demand.
//!
//! Per tile: `unbuilt -> built with source -> built without source`. A tile
//! that has been split, or sits at `maxzoom`, never holds source again.
//!
//! # Example
//!
//! ```
//! use s2tiler::cell::CellId;
//! use s2tiler::coord::Face;
//! use s2tiler::geometry::{GeometryInput, SourceCollection, SourceFeature};
//! use s2tiler::index::{TileIndex, TileIndexConfig};
//!
//! let collection: SourceCollection =
//!     [SourceFeature::lon_lat(GeometryInput::Point(vec![0.0, 0.0]))].into_iter().collect();
//! let mut index = TileIndex::new(&collection, TileIndexConfig::default()).unwrap();
//!
//! let root = CellId::from_face(Face::ALL[0]);
//! let tile = index.get_tile(root).unwrap();
//! assert_eq!(tile.layers["default"].features.len(), 1);
//! ```

mod config;
mod error;

pub use config::{
    ConfigError, LayerZoomRange, TileIndexConfig, DEFAULT_BUFFER, DEFAULT_EXTENT, DEFAULT_INDEX_MAXZOOM,
    DEFAULT_INDEX_MAX_POINTS, DEFAULT_LAYER_NAME, DEFAULT_LAYER_PROPERTY, DEFAULT_MAXZOOM, DEFAULT_MINZOOM,
    DEFAULT_TOLERANCE, MAX_BUFFER, MAX_SUPPORTED_ZOOM,
};
pub use error::IndexError;

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, trace, warn};

use crate::cell::Projection;
use crate::coord::Face;
use crate::geometry::{split_into_children, Feature, GeometryProjector, SourceCollection};
use crate::tile::{Tile, VectorTile};

/// Summary of the tiles built so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of built tiles at each zoom
    pub tiles_per_zoom: BTreeMap<u8, usize>,
    pub total_tiles: usize,
    /// Projected vertices across all faces
    pub total_points: usize,
    /// Tiles still holding source features
    pub retained_sources: usize,
}

/// A lazily refined pyramid of tiles.
#[derive(Debug)]
pub struct TileIndex {
    config: TileIndexConfig,
    faces: Vec<Face>,
    tiles: HashMap<u64, Tile>,
}

impl TileIndex {
    /// Projects `collection` and builds the eager part of the pyramid.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if the configuration is invalid or any feature is
    /// malformed.
    pub fn new(collection: &SourceCollection, config: TileIndexConfig) -> Result<Self, IndexError> {
        Self::build_with_cancel(collection, config, || false)
    }

    /// Parses a JSON feature envelope and builds an index from it.
    pub fn from_json_str(json: &str, config: TileIndexConfig) -> Result<Self, IndexError> {
        let collection = SourceCollection::from_json_str(json)?;
        Self::new(&collection, config)
    }

    /// Reads features from a file (`.gz` is decompressed) and builds an index.
    pub fn from_path<P: AsRef<Path>>(path: P, config: TileIndexConfig) -> Result<Self, IndexError> {
        let collection = SourceCollection::from_path(path)?;
        Self::new(&collection, config)
    }

    /// Like [`TileIndex::new`], polling `should_cancel` after every tile
    /// popped from the work stack.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Cancelled` as soon as `should_cancel` returns true.
    pub fn build_with_cancel<F>(
        collection: &SourceCollection,
        config: TileIndexConfig,
        mut should_cancel: F,
    ) -> Result<Self, IndexError>
    where
        F: FnMut() -> bool,
    {
        config.validate()?;

        let projector = GeometryProjector::new(config.projection, config.projection_sq_tolerance());
        let features = projector.project_collection(collection)?;

        let mut by_face: BTreeMap<Face, Vec<Feature>> = BTreeMap::new();
        for feature in features {
            by_face.entry(feature.face).or_default().push(feature);
        }

        let mut index = TileIndex {
            config,
            faces: by_face.keys().copied().collect(),
            tiles: HashMap::new(),
        };

        for (face, features) in by_face {
            let root = index.config.projection.root(face);
            debug!(face = %face, features = features.len(), "Building face");
            if let Err(e) = index.split_tile(features, root, None, &mut should_cancel) {
                warn!(face = %face, tiles = index.tiles.len(), "Index build cancelled");
                return Err(e);
            }
        }

        info!(
            projection = %index.config.projection,
            faces = index.faces.len(),
            tiles = index.tiles.len(),
            features = collection.len(),
            "Tile index built"
        );
        Ok(index)
    }

    /// Splits tiles starting at `(features, id)`.
    ///
    /// Without a target this is the eager build. With one, splitting follows
    /// only the branch that contains the target and stops at its zoom.
    fn split_tile(
        &mut self,
        features: Vec<Feature>,
        id: u64,
        target: Option<(u64, u8)>,
        should_cancel: &mut dyn FnMut() -> bool,
    ) -> Result<(), IndexError> {
        let projection = self.config.projection;
        let mut stack = vec![(features, id)];

        while let Some((features, id)) = stack.pop() {
            if should_cancel() {
                return Err(IndexError::Cancelled);
            }

            let config = &self.config;
            let (tile, created) = match self.tiles.entry(id) {
                Entry::Occupied(entry) => (entry.into_mut(), false),
                Entry::Vacant(entry) => {
                    let tile = Tile::create(&features, id, config);
                    trace!(
                        tile = id,
                        zoom = tile.zoom(),
                        features = tile.num_features(),
                        points = tile.num_points(),
                        "Created tile"
                    );
                    (entry.insert(tile), true)
                }
            };
            let zoom = tile.zoom();

            let stop = zoom >= config.maxzoom
                || match target {
                    None => zoom >= config.index_maxzoom || tile.num_points() <= config.index_max_points,
                    Some((target_id, target_zoom)) => zoom >= target_zoom || !projection.contains(id, target_id),
                };

            if stop {
                if created && zoom < config.maxzoom {
                    tile.source = Some(features);
                }
                continue;
            }

            tile.source = None;
            let (i, j) = tile.position();
            let bbox = tile.bbox();
            let face = tile.face();

            let children = split_into_children(&features, zoom, i, j, config.buffer, &bbox);
            drop(features);

            let child_ids = projection.children_ij(face, zoom, i, j);
            for (child_features, child_id) in children.into_iter().zip(child_ids) {
                if !child_features.is_empty() {
                    stack.push((child_features, child_id));
                }
            }
        }

        Ok(())
    }

    /// Returns the tile `id`, building it from the nearest ancestor that
    /// still holds source features if needed.
    ///
    /// `None` when `id` is outside `[minzoom, maxzoom]`, on a face without
    /// data, or simply has no features.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a well-formed id under the index's projection.
    pub fn get_tile(&mut self, id: impl Into<u64>) -> Option<&VectorTile> {
        let id = id.into();
        let projection = self.config.projection;
        if let Err(e) = projection.validate(id) {
            panic!("get_tile called with a malformed tile id: {}", e);
        }

        let (face, zoom, _, _) = projection.to_face_zoom_ij(id);
        if zoom < self.config.minzoom || zoom > self.config.maxzoom || !self.faces.contains(&face) {
            return None;
        }

        if !self.tiles.contains_key(&id) {
            let mut ancestor = id;
            let parent = loop {
                match projection.parent(ancestor) {
                    Some(parent) if self.tiles.contains_key(&parent) => break parent,
                    Some(parent) => ancestor = parent,
                    None => return None,
                }
            };

            let source = self.tiles.get_mut(&parent)?.source.take()?;
            debug!(tile = id, ancestor = parent, zoom, "Splitting on demand");
            self.split_tile(source, parent, Some((id, zoom)), &mut || false).ok()?;
        }

        let extent = self.config.extent;
        self.tiles.get_mut(&id).map(|tile| &*tile.output(extent))
    }

    /// Number of tiles built so far.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Faces that received at least one feature, in ascending order.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn is_built(&self, id: impl Into<u64>) -> bool {
        self.tiles.contains_key(&id.into())
    }

    /// Whether tile `id` exists and still holds its source features.
    pub fn retains_source(&self, id: impl Into<u64>) -> bool {
        self.tiles
            .get(&id.into())
            .is_some_and(|tile| tile.retains_source())
    }

    /// Built tile ids in ascending order.
    pub fn tile_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.tiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            total_tiles: self.tiles.len(),
            ..IndexStats::default()
        };
        for tile in self.tiles.values() {
            *stats.tiles_per_zoom.entry(tile.zoom()).or_default() += 1;
            if tile.zoom() == 0 {
                stats.total_points += tile.num_points();
            }
            if tile.retains_source() {
                stats.retained_sources += 1;
            }
        }
        stats
    }

    pub fn config(&self) -> &TileIndexConfig {
        &self.config
    }

    pub fn projection(&self) -> Projection {
        self.config.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellId;
    use crate::geometry::{GeometryInput, SourceFeature};

    fn points(coords: &[(f64, f64)]) -> SourceCollection {
        coords
            .iter()
            .map(|&(lon, lat)| SourceFeature::lon_lat(GeometryInput::Point(vec![lon, lat])))
            .collect()
    }

    fn face_root(face: u8) -> CellId {
        CellId::from_face(Face::ALL[face as usize])
    }

    #[test]
    fn test_empty_collection() {
        let mut index = TileIndex::new(&SourceCollection::default(), TileIndexConfig::default()).unwrap();
        assert_eq!(index.tile_count(), 0);
        assert!(index.faces().is_empty());
        assert!(index.get_tile(face_root(0)).is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TileIndexConfig::default().with_maxzoom(30);
        let result = TileIndex::new(&points(&[(0.0, 0.0)]), config);
        assert!(matches!(result, Err(IndexError::Config(_))));
    }

    #[test]
    fn test_small_input_stops_at_root() {
        let index = TileIndex::new(&points(&[(0.0, 0.0), (1.0, 1.0)]), TileIndexConfig::default()).unwrap();
        assert_eq!(index.faces(), &[Face::ALL[0]]);
        assert_eq!(index.tile_count(), 1);
        assert!(index.retains_source(face_root(0)));
    }

    #[test]
    fn test_eager_build_splits_down_to_index_maxzoom() {
        let config = TileIndexConfig::default().with_index_max_points(0).with_index_maxzoom(3);
        let index = TileIndex::new(&points(&[(10.0, 10.0)]), config).unwrap();
        let stats = index.stats();
        // one point follows a single branch
        assert_eq!(stats.tiles_per_zoom.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(stats.total_tiles, 4);
        assert_eq!(stats.retained_sources, 1);
        assert!(!index.retains_source(face_root(0)));
    }

    #[test]
    fn test_get_tile_deepens_lazily() {
        let mut index = TileIndex::new(&points(&[(10.0, 10.0)]), TileIndexConfig::default()).unwrap();
        let leaf = CellId::from_lon_lat(crate::coord::LonLat::new(10.0, 10.0)).parent_at(8);
        assert!(!index.is_built(leaf));

        let tile = index.get_tile(leaf).unwrap();
        assert_eq!(tile.zoom, 8);
        assert_eq!(tile.num_features(), 1);

        assert!(index.is_built(leaf));
        assert!(!index.retains_source(face_root(0)));
        assert!(index.retains_source(leaf));
        // intermediate tiles were built and released their source
        assert!(index.is_built(leaf.parent_at(4)));
        assert!(!index.retains_source(leaf.parent_at(4)));
    }

    #[test]
    fn test_get_tile_misses() {
        let config = TileIndexConfig::default().with_minzoom(1).with_maxzoom(10);
        let mut index = TileIndex::new(&points(&[(10.0, 10.0)]), config).unwrap();
        // below minzoom
        assert!(index.get_tile(face_root(0)).is_none());
        // empty face
        assert!(index.get_tile(face_root(3).child(0)).is_none());
        // beyond maxzoom
        let deep = CellId::from_lon_lat(crate::coord::LonLat::new(10.0, 10.0)).parent_at(11);
        assert!(index.get_tile(deep).is_none());
        // a quadrant without data
        let empty = CellId::from_lon_lat(crate::coord::LonLat::new(-30.0, -30.0)).parent_at(5);
        assert_eq!(empty.face(), Face::ALL[0]);
        assert!(index.get_tile(empty).is_none());
    }

    #[test]
    #[should_panic(expected = "malformed tile id")]
    fn test_get_tile_panics_on_corrupt_id() {
        let mut index = TileIndex::new(&points(&[(0.0, 0.0)]), TileIndexConfig::default()).unwrap();
        let _ = index.get_tile(0u64);
    }

    #[test]
    fn test_cancellation() {
        let config = TileIndexConfig::default().with_index_max_points(0);
        let mut polls = 0;
        let result = TileIndex::build_with_cancel(&points(&[(10.0, 10.0)]), config, || {
            polls += 1;
            polls > 2
        });
        assert!(matches!(result, Err(IndexError::Cancelled)));
        assert_eq!(polls, 3);
    }

    #[test]
    fn test_maxzoom_tiles_drop_source() {
        let config = TileIndexConfig::default()
            .with_maxzoom(2)
            .with_index_maxzoom(2)
            .with_index_max_points(0);
        let index = TileIndex::new(&points(&[(10.0, 10.0)]), config).unwrap();
        assert_eq!(index.stats().retained_sources, 0);
        assert_eq!(index.tile_count(), 3);
    }
}
