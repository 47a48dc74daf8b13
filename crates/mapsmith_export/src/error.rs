use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while exporting maps
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read image size of {path}: {source}")]
    ImageSize {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("No image size known for tileset '{tileset}' ({image})")]
    MissingImageSize { tileset: String, image: String },
    #[error("Failed to write Lua: {0}")]
    Lua(#[from] std::fmt::Error),
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}
