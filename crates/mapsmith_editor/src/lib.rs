//! mapsmith_editor - Map authoring engine
//!
//! This crate provides everything behind the editor canvas:
//! - Project document with item registry and per-map content
//! - Tile placement, area fill and deletion
//! - Node authoring for point, path and graph node types
//! - Undo/redo over whole-document snapshots
//! - Project save/load and editor configuration
//!
//! # Usage
//!
//! ```rust,no_run
//! use mapsmith_editor::{EditorConfig, EditorSession, Document};
//! use mapsmith_core::{ItemType, TileFragment};
//!
//! let mut session = EditorSession::new(Document::new("demo"), EditorConfig::default());
//! session.add_item(ItemType::Map);
//! session.add_item(ItemType::Layer);
//! let tileset = session.add_item(ItemType::Tileset);
//! session.select_item(Some(tileset));
//! session.select_tiles(vec![TileFragment { path: "terrain.png".into(), x: 0, y: 0, w: 32, h: 32 }]);
//! session.on_place(40.0, 12.0).unwrap();
//! session.undo();
//! ```

mod canvas;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod node_editor;
pub mod project;
pub mod session;
pub mod store;

pub use mapsmith_core;
pub use mapsmith_export;

pub use config::{EditorConfig, ExportConfig, DEFAULT_HISTORY_SIZE};
pub use document::{CanvasState, Document, ProjectInfo};
pub use error::{ConfigError, ProjectError};
pub use history::History;
pub use node_editor::NodeEditor;
pub use project::{load_project, parse_project, save_project, ProjectFile, CURRENT_VERSION};
pub use session::{EditorSession, Key, KeyPress};
pub use store::{DocumentStore, SubscriptionId};
