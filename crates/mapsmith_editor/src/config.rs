//! Editor configuration
//!
//! Stored as TOML in the platform config directory:
//! - Windows: %APPDATA%/mapsmith/config/config.toml
//! - Linux: ~/.config/mapsmith/config.toml
//! - macOS: ~/Library/Application Support/mapsmith/config.toml

use crate::error::ConfigError;
use directories::ProjectDirs;
use mapsmith_core::Snap;
use mapsmith_export::{ExportFormat, ExportOptions, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_HISTORY_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept before the oldest is dropped
    pub history_size: usize,
    /// Grid step given to newly added maps
    pub default_snap: Snap,
    pub export: ExportConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            default_snap: Snap::new(32, 32),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub chunk_size: u32,
    pub format: ExportFormat,
    /// Output directory, relative to the project root unless absolute
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            format: ExportFormat::Lua,
            directory: PathBuf::from("assets/map"),
        }
    }
}

impl ExportConfig {
    pub fn options(&self, project_root: &Path) -> ExportOptions {
        ExportOptions {
            chunk_size: self.chunk_size,
            format: self.format,
            directory: project_root.join(&self.directory),
        }
    }
}

impl EditorConfig {
    /// `config.toml` under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mapsmith").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
