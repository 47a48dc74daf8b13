//! Project file save/load
//!
//! A project is one pretty-printed JSON document holding the project info,
//! the sidebar item registry and the canvas map store.

use crate::document::{CanvasState, Document, ProjectInfo};
use crate::error::ProjectError;
use mapsmith_core::Item;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Newest project file version this build reads and writes
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SidebarState {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub sidebar: SidebarState,
    #[serde(default)]
    pub canvas: CanvasState,
}

impl From<&Document> for ProjectFile {
    fn from(doc: &Document) -> Self {
        Self {
            version: CURRENT_VERSION,
            project: doc.project.clone(),
            sidebar: SidebarState {
                items: doc.sidebar.items.clone(),
            },
            canvas: doc.canvas.clone(),
        }
    }
}

impl ProjectFile {
    pub fn into_document(self) -> Document {
        Document {
            project: self.project,
            sidebar: mapsmith_core::ItemRegistry {
                items: self.sidebar.items,
            },
            canvas: self.canvas,
        }
    }
}

/// Parse a project from JSON text
pub fn parse_project(json: &str) -> Result<Document, ProjectError> {
    let file: ProjectFile = serde_json::from_str(json)?;
    if file.version > CURRENT_VERSION {
        return Err(ProjectError::UnsupportedVersion {
            found: file.version,
            supported: CURRENT_VERSION,
        });
    }
    Ok(file.into_document())
}

pub fn load_project(path: &Path) -> Result<Document, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_project(&content)?;
    info!("Loaded project '{}' from {}", doc.project.name, path.display());
    Ok(doc)
}

pub fn save_project(path: &Path, doc: &Document) -> Result<(), ProjectError> {
    let content = serde_json::to_string_pretty(&ProjectFile::from(doc))?;
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved project to {}", path.display());
    Ok(())
}
