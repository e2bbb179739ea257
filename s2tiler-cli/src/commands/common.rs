//! Common types and utilities shared across CLI commands.

use clap::{Args, ValueEnum};
use std::path::Path;

use s2tiler::{Projection, TileIndexConfig};

use crate::error::CliError;

/// Tiling scheme selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ProjectionArg {
    /// Six cube faces addressed by S2 cell id
    S2,
    /// Single Web Mercator square addressed by zoom/x/y
    Wm,
}

impl From<ProjectionArg> for Projection {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::S2 => Projection::S2,
            ProjectionArg::Wm => Projection::WebMercator,
        }
    }
}

/// Index options that override the config file when given.
#[derive(Debug, Clone, Default, Args)]
pub struct IndexOverrides {
    /// Tiling scheme
    #[arg(long, value_enum)]
    pub projection: Option<ProjectionArg>,

    /// Shallowest zoom served
    #[arg(long)]
    pub minzoom: Option<u8>,

    /// Deepest zoom served (at most 24)
    #[arg(long)]
    pub maxzoom: Option<u8>,

    /// Depth of the eager build
    #[arg(long)]
    pub index_maxzoom: Option<u8>,

    /// Vertex budget below which the eager build stops splitting
    #[arg(long)]
    pub index_max_points: Option<usize>,

    /// Simplification tolerance in output units
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Output grid size per tile
    #[arg(long)]
    pub extent: Option<u32>,

    /// Clip buffer as a fraction of tile width
    #[arg(long)]
    pub buffer: Option<f64>,

    /// Feature property that selects the output layer
    #[arg(long)]
    pub layer_property: Option<String>,
}

impl IndexOverrides {
    /// Applies the given options on top of `config`; CLI takes precedence.
    pub fn apply(&self, mut config: TileIndexConfig) -> TileIndexConfig {
        if let Some(projection) = self.projection {
            config.projection = projection.into();
        }
        if let Some(minzoom) = self.minzoom {
            config.minzoom = minzoom;
        }
        if let Some(maxzoom) = self.maxzoom {
            config.maxzoom = maxzoom;
            // keep a config-file eager depth from exceeding a lowered maxzoom
            config.index_maxzoom = config.index_maxzoom.min(maxzoom);
        }
        if let Some(index_maxzoom) = self.index_maxzoom {
            config.index_maxzoom = index_maxzoom;
        }
        if let Some(index_max_points) = self.index_max_points {
            config.index_max_points = index_max_points;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(extent) = self.extent {
            config.extent = extent;
        }
        if let Some(buffer) = self.buffer {
            config.buffer = buffer;
        }
        if let Some(property) = &self.layer_property {
            config.layer_property = property.clone();
        }
        config
    }
}

/// Writes `content` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, content).map_err(|error| CliError::FileWrite {
            path: path.display().to_string(),
            error,
        }),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}
