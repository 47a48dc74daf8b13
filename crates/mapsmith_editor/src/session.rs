//! Editor session: the live document plus everything that reacts to input
//!
//! Persisted changes go through [`EditorSession::apply`], which records one
//! history entry per call that changed the document. Selection state and the
//! pending node buffer live outside the document and are never recorded.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::history::History;
use crate::node_editor::NodeEditor;
use crate::store::DocumentStore;
use mapsmith_core::{
    fill_anchors, snap, ConnectType, Coord, GeometryError, Item, ItemId, ItemType, TileFragment,
    TileKey, TileSelection,
};
use mapsmith_export::{export_maps, ExportError, ExportSnapshot, ImageSizeResolver};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            shift: false,
        }
    }

    pub fn ctrl_shift(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            shift: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct EditorSession {
    store: DocumentStore,
    history: History,
    nodes: NodeEditor,
    config: EditorConfig,
    /// Item driving what a click on the canvas does
    selected_item: Option<ItemId>,
    /// Fragments picked in the tileset browser for the selected tileset
    selected_tiles: Vec<TileFragment>,
}

impl EditorSession {
    pub fn new(document: Document, config: EditorConfig) -> Self {
        Self {
            store: DocumentStore::new(document),
            history: History::new(config.history_size),
            nodes: NodeEditor::new(),
            config,
            selected_item: None,
            selected_tiles: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        self.store.get()
    }

    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn nodes(&self) -> &NodeEditor {
        &self.nodes
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Swap in a freshly loaded document; history starts over
    pub fn load(&mut self, document: Document) {
        self.store.set(document);
        self.history.reset();
        self.nodes.reset();
        self.selected_item = None;
        self.selected_tiles.clear();
    }

    /// Run a document operation, recording history when it changed something
    pub fn apply(&mut self, op: impl FnOnce(&mut Document) -> bool) -> bool {
        let before = self.store.get().clone();
        let changed = self.store.update(op);
        if changed {
            self.history.record(before);
        }
        changed
    }

    pub fn undo(&mut self) -> bool {
        let history = &mut self.history;
        let undone = self.store.update(|doc| history.undo(doc));
        if undone {
            self.nodes.clear_selection();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let history = &mut self.history;
        let redone = self.store.update(|doc| history.redo(doc));
        if redone {
            self.nodes.clear_selection();
        }
        redone
    }

    pub fn selected_item(&self) -> Option<ItemId> {
        self.selected_item
    }

    /// Change the item that canvas clicks act on.
    ///
    /// Switching items drops any pending node points.
    pub fn select_item(&mut self, id: Option<ItemId>) {
        if self.selected_item != id {
            self.nodes.reset();
            self.selected_tiles.clear();
        }
        self.selected_item = id;
    }

    pub fn select_tiles(&mut self, fragments: Vec<TileFragment>) {
        self.selected_tiles = fragments;
    }

    /// Current tileset selection, if a tileset is the selected item
    pub fn tile_selection(&self) -> Option<TileSelection> {
        let id = self.selected_item?;
        self.document().sidebar.tileset(id)?;
        Some(TileSelection::new(id, self.selected_tiles.clone()))
    }

    pub fn select_node(&mut self, key: Uuid, force: bool) -> bool {
        self.nodes.select_node(key, force)
    }

    pub fn add_item(&mut self, item_type: ItemType) -> ItemId {
        let default_snap = self.config.default_snap;
        let mut id = Uuid::nil();
        self.apply(|doc| {
            id = doc.add_item(item_type, default_snap);
            true
        });
        id
    }

    pub fn update_item(&mut self, id: ItemId, edit: impl FnOnce(&mut Item)) -> bool {
        self.apply(|doc| doc.update_item(id, edit))
    }

    pub fn delete_item(&mut self, id: ItemId) -> bool {
        if self.selected_item == Some(id) {
            self.select_item(None);
        }
        self.apply(|doc| doc.delete_item(id))
    }

    /// Switch maps and return the camera to restore
    pub fn set_map(&mut self, id: ItemId) -> Option<Coord> {
        let mut camera = None;
        self.store.update(|doc| {
            camera = doc.set_map(id);
            camera.is_some()
        });
        camera
    }

    pub fn set_layer(&mut self, id: ItemId) -> bool {
        self.store.update(|doc| doc.set_layer(id))
    }

    pub fn set_camera(&mut self, x: i32, y: i32) -> bool {
        self.store.update(|doc| doc.set_camera(x, y))
    }

    /// Handle a click on the canvas at raw map coordinates.
    ///
    /// Tilesets stamp the current selection. Node types add a point to the
    /// pending buffer, commit right away for `none` nodes, or extend the
    /// selected graph node when one is focused.
    pub fn on_place(&mut self, x: f64, y: f64) -> Result<bool, GeometryError> {
        let at = Coord::from_raw(x, y)?;
        let Some(id) = self.selected_item else {
            return Ok(false);
        };
        let Some(item_type) = self.document().sidebar.get(id).map(Item::item_type) else {
            return Ok(false);
        };
        Ok(match item_type {
            ItemType::Tileset => match self.tile_selection() {
                Some(selection) => self.apply(|doc| doc.place_tiles(&[at], &selection)),
                None => false,
            },
            ItemType::Node => self.place_node_point(id, at),
            _ => false,
        })
    }

    fn place_node_point(&mut self, node_type: ItemId, at: Coord) -> bool {
        if let Some(key) = self.nodes.selected_node() {
            if self.document().connect_type_of(key) == Some(ConnectType::Graph) {
                return self.apply(|doc| doc.append_node_point(key, at));
            }
        }
        let Some(connect_type) = self.document().sidebar.node_type(node_type).map(|n| n.connect_type)
        else {
            return false;
        };
        let Some((step, offset)) = self.document().current_snap() else {
            return false;
        };
        match self.nodes.add_point(snap(at, step, offset), connect_type) {
            Some(points) => self.apply(|doc| doc.commit_node(node_type, points).is_some()),
            None => true,
        }
    }

    /// Fill the dragged rectangle with stamps of the current tile selection
    pub fn place_fill(&mut self, start: (f64, f64), end: (f64, f64)) -> Result<bool, GeometryError> {
        let start = Coord::from_raw(start.0, start.1)?;
        let end = Coord::from_raw(end.0, end.1)?;
        let Some(selection) = self.tile_selection().filter(|s| !s.is_empty()) else {
            return Ok(false);
        };
        let Some((step, offset)) = self.document().current_snap() else {
            return Ok(false);
        };
        let (w, h) = selection.extent(step);
        let anchors = fill_anchors(start, end, w, h, step, offset);
        debug!("Filling {} anchors", anchors.len());
        Ok(self.apply(|doc| doc.place_tiles(&anchors, &selection)))
    }

    pub fn delete_tile(&mut self, key: &TileKey) -> bool {
        self.apply(|doc| doc.delete_tile(key))
    }

    pub fn delete_tile_area(&mut self, start: Coord, end: Coord) -> bool {
        self.apply(|doc| doc.delete_tile_area(start, end))
    }

    pub fn delete_node(&mut self, key: Uuid) -> bool {
        if self.nodes.selected_node() == Some(key) {
            self.nodes.clear_selection();
        }
        self.apply(|doc| doc.delete_node(key))
    }

    pub fn delete_node_point(&mut self, key: Uuid, idx: usize) -> bool {
        self.apply(|doc| doc.delete_node_point(key, idx))
    }

    pub fn toggle_node_edge(&mut self, key: Uuid, a: Coord, b: Coord) -> bool {
        self.apply(|doc| doc.toggle_node_edge(key, a, b))
    }

    pub fn move_node_point(&mut self, key: Uuid, idx: usize, to: Coord) -> bool {
        self.apply(|doc| doc.move_node_point(key, idx, to))
    }

    pub fn insert_path_midpoint(&mut self, key: Uuid, segment: usize) -> Option<usize> {
        let mut inserted = None;
        self.apply(|doc| {
            inserted = doc.insert_path_midpoint(key, segment);
            inserted.is_some()
        });
        inserted
    }

    /// Commit the pending node buffer on the current map and layer
    pub fn finish_node(&mut self) -> Option<Uuid> {
        let node_type = self
            .selected_item
            .filter(|id| self.document().sidebar.node_type(*id).is_some())?;
        let points = self.nodes.finish()?;
        let mut key = None;
        self.apply(|doc| {
            key = doc.commit_node(node_type, points);
            key.is_some()
        });
        key
    }

    /// Remove an uncommitted point; `idx` picks the point for graph nodes
    pub fn undo_pending_point(&mut self, idx: Option<usize>) -> bool {
        let Some(connect_type) = self
            .selected_item
            .and_then(|id| self.document().sidebar.node_type(id))
            .map(|n| n.connect_type)
        else {
            return false;
        };
        self.nodes.undo_point(connect_type, idx).is_some()
    }

    /// Returns whether the key was handled
    pub fn handle_key(&mut self, press: KeyPress) -> bool {
        match (press.key, press.ctrl, press.shift) {
            (Key::Enter, _, _) => {
                self.finish_node();
                self.nodes.clear_selection();
                true
            }
            (Key::Escape, _, _) => {
                self.nodes.reset();
                true
            }
            (Key::Char('z' | 'Z'), true, false) => {
                self.undo();
                true
            }
            (Key::Char('y' | 'Y'), true, _) | (Key::Char('z' | 'Z'), true, true) => {
                self.redo();
                true
            }
            _ => false,
        }
    }

    /// Export every map under `project_root` using the configured options.
    ///
    /// The document is captured before any image is read or file written.
    pub fn export(
        &self,
        project_root: &Path,
        resolver: &dyn ImageSizeResolver,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let doc = self.document();
        let snapshot = ExportSnapshot::capture(&doc.sidebar, &doc.canvas.maps);
        let options = self.config.export.options(project_root);
        match export_maps(&snapshot, resolver, &options) {
            Ok(paths) => {
                info!("Exported {} maps to {}", paths.len(), options.directory.display());
                Ok(paths)
            }
            Err(e) => {
                error!("Export failed: {}", e);
                Err(e)
            }
        }
    }
}
