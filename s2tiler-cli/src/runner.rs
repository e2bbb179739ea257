//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and index building
//! so command handlers stay small.

use std::path::{Path, PathBuf};
use std::time::Instant;

use s2tiler::config::ConfigFile;
use s2tiler::logging::{init_logging, LoggingGuard};
use s2tiler::{TileIndex, TileIndexConfig};
use tracing::info;

use crate::error::CliError;

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Explicit config file; must exist when given
    pub config: Option<PathBuf>,
    pub verbose: bool,
    /// Overrides the `[logging]` directory
    pub log_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Loads the config file named by `--config`, or the default one.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        match &self.config {
            Some(path) if !path.exists() => Err(CliError::ConfigNotFound(path.clone())),
            Some(path) => Ok(ConfigFile::load_from(path)?),
            None => Ok(ConfigFile::load()?),
        }
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = options.load_config()?;

        let log_dir = options
            .log_dir
            .clone()
            .unwrap_or_else(|| config.logging.directory.clone());
        let logging_guard = init_logging(&log_dir, &config.logging.file, options.verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("s2tiler v{}", env!("CARGO_PKG_VERSION"));
        info!(
            command,
            projection = %self.config.index.projection,
            maxzoom = self.config.index.maxzoom,
            "s2tiler CLI"
        );
    }
}

/// Reads `input` and builds an index, logging how long it took.
pub fn build_index(input: &Path, config: TileIndexConfig) -> Result<TileIndex, CliError> {
    let started = Instant::now();
    let index = TileIndex::from_path(input, config).map_err(|error| CliError::Index {
        path: input.display().to_string(),
        error,
    })?;
    info!(
        input = %input.display(),
        tiles = index.tile_count(),
        faces = index.faces().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Index ready"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let options = GlobalOptions {
            config: Some(temp_dir.path().join("missing.ini")),
            ..GlobalOptions::default()
        };
        assert!(matches!(options.load_config(), Err(CliError::ConfigNotFound(_))));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[index]\nmaxzoom = 9\n").unwrap();

        let options = GlobalOptions {
            config: Some(path),
            ..GlobalOptions::default()
        };
        assert_eq!(options.load_config().unwrap().index.maxzoom, 9);
    }

    #[test]
    fn test_build_index_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = build_index(&path, TileIndexConfig::default()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
