use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Cluster metadata not found. Looked in:\n\
        - ./metadata.json\n\
        - ./.cloudsweep/metadata.json\n\
        - ~/.config/cloudsweep/metadata.json\n\
        Set CLOUDSWEEP_METADATA_PATH or pass --metadata to point at it directly"
    )]
    MetadataNotFound,

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid metadata: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
