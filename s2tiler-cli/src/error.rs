//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use s2tiler::config::ConfigFileError;
use s2tiler::geometry::InputError;
use s2tiler::{CellError, IndexError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Config file could not be loaded or saved
    Config(ConfigFileError),
    /// `--config` names a file that does not exist
    ConfigNotFound(PathBuf),
    /// `init` would overwrite an existing file
    ConfigExists(PathBuf),
    /// Failed to build an index from an input file
    Index { path: String, error: IndexError },
    /// Tile address that cannot be served by the index
    InvalidAddress { text: String, reason: String },
    /// Cell id or token that does not parse
    InvalidCell { text: String, error: CellError },
    /// Failed to serialize output
    Serialize(serde_json::Error),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Index {
                error: IndexError::Input(InputError::Json(_)),
                ..
            } => {
                eprintln!();
                eprintln!("Input must be a JSON object with one of these types:");
                eprintln!("  FeatureCollection / Feature       - lon/lat coordinates");
                eprintln!("  S2FeatureCollection / S2Feature   - face-local coordinates with a 'face' tag");
                eprintln!("Files ending in .gz are decompressed automatically.");
            }
            CliError::InvalidAddress { .. } => {
                eprintln!();
                eprintln!("Accepted tile addresses:");
                eprintln!("  s2/<face>/<zoom>/<i>/<j>   e.g. s2/0/3/4/4");
                eprintln!("  wm/<zoom>/<x>/<y>          e.g. wm/2/1/1");
                eprintln!("  <decimal id> or 0x<hex id>");
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with the defaults.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::ConfigNotFound(path) => write!(f, "Config file not found: {}", path.display()),
            CliError::ConfigExists(path) => write!(f, "Config file already exists: {}", path.display()),
            CliError::Index { path, error } => write!(f, "Failed to index '{}': {}", path, error),
            CliError::InvalidAddress { text, reason } => {
                write!(f, "Invalid tile address '{}': {}", text, reason)
            }
            CliError::InvalidCell { text, error } => write!(f, "Invalid cell '{}': {}", text, error),
            CliError::Serialize(e) => write!(f, "Failed to serialize output: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Index { error, .. } => Some(error),
            CliError::InvalidCell { error, .. } => Some(error),
            CliError::Serialize(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialize(e)
    }
}
