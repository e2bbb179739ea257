//! User configuration file.
//!
//! `config.ini` carries the tile index options plus logging settings. Values
//! present in the file are overlaid on the built-in defaults, so a partial or
//! missing file is always valid.
//!
//! ```ini
//! [index]
//! projection = s2
//! maxzoom = 14
//!
//! [layers]
//! labels = 6-14
//!
//! [logging]
//! directory = ~/.local/state/s2tiler
//! ```

mod file;
mod parser;
mod writer;

pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, LoggingSettings, DEFAULT_LOG_DIR,
    DEFAULT_LOG_FILE,
};
