//! Init command - write the default configuration file.

use std::path::{Path, PathBuf};

use s2tiler::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Writes to `path` when given, otherwise to the default config location.
pub fn run(path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = write_default(path, force)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize s2tiler settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

fn write_default(path: Option<&Path>, force: bool) -> Result<PathBuf, CliError> {
    let path = path.map_or_else(config_file_path, Path::to_path_buf);
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path));
    }
    ConfigFile::default().save_to(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_loadable_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s2tiler").join("config.ini");

        let written = write_default(Some(&path), false).unwrap();
        assert_eq!(written, path);
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[index]\nmaxzoom = 9\n").unwrap();

        assert!(matches!(
            write_default(Some(&path), false),
            Err(CliError::ConfigExists(_))
        ));

        write_default(Some(&path), true).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }
}
