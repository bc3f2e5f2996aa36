pub mod error;
pub mod metadata;

pub use error::*;
pub use metadata::{ClusterMetadata, PowerVsMetadata};

use std::path::PathBuf;

const METADATA_FILE: &str = "metadata.json";

/// cloudsweep's config directory, created on first use
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("cloudsweep");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the cluster's `metadata.json`
///
/// Search order:
/// 1. `CLOUDSWEEP_METADATA_PATH` env var (direct path)
/// 2. `./metadata.json`
/// 3. `./.cloudsweep/metadata.json`
/// 4. `~/.config/cloudsweep/metadata.json`
pub fn find_metadata_file() -> Result<PathBuf> {
    if let Ok(metadata_path) = std::env::var("CLOUDSWEEP_METADATA_PATH") {
        let path = PathBuf::from(metadata_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    let path = current_dir.join(METADATA_FILE);
    if path.exists() {
        return Ok(path);
    }

    let path = current_dir.join(".cloudsweep").join(METADATA_FILE);
    if path.exists() {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("cloudsweep").join(METADATA_FILE);
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::MetadataNotFound)
}

/// Load metadata from an explicit path, or from wherever `find_metadata_file` finds it
pub fn load_metadata(path: Option<PathBuf>) -> Result<ClusterMetadata> {
    let path = match path {
        Some(path) => path,
        None => find_metadata_file()?,
    };
    ClusterMetadata::load(&path)
}
