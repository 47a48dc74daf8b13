use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or saving a project file
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse project: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported project version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Errors that can occur when loading or saving the editor configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
