//! The persisted editor document and its item-level operations
//!
//! Every mutating operation returns whether the document changed. Missing
//! context (no current map, unknown item) is a silent no-op.

use mapsmith_core::{
    ContentIndex, Coord, FieldType, Item, ItemId, ItemRegistry, ItemType, Map, Snap,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: String,
}

/// Map content plus the current map/layer selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CanvasFields")]
pub struct CanvasState {
    #[serde(default)]
    pub maps: BTreeMap<ItemId, Map>,
    #[serde(default)]
    pub current_map: Option<ItemId>,
    #[serde(default)]
    pub current_layer: Option<ItemId>,
    #[serde(skip)]
    pub(crate) index: ContentIndex,
}

/// Persisted part of [`CanvasState`]; the index is rebuilt from it
#[derive(Deserialize)]
struct CanvasFields {
    #[serde(default)]
    maps: BTreeMap<ItemId, Map>,
    #[serde(default)]
    current_map: Option<ItemId>,
    #[serde(default)]
    current_layer: Option<ItemId>,
}

impl From<CanvasFields> for CanvasState {
    fn from(fields: CanvasFields) -> Self {
        let index = ContentIndex::rebuild(&fields.maps);
        Self {
            maps: fields.maps,
            current_map: fields.current_map,
            current_layer: fields.current_layer,
            index,
        }
    }
}

// the index is derived data
impl PartialEq for CanvasState {
    fn eq(&self, other: &Self) -> bool {
        self.maps == other.maps
            && self.current_map == other.current_map
            && self.current_layer == other.current_layer
    }
}

impl CanvasState {
    pub fn map(&self, id: ItemId) -> Option<&Map> {
        self.maps.get(&id)
    }

    /// Current `(map, layer)` pair when both are set
    pub fn current(&self) -> Option<(ItemId, ItemId)> {
        Some((self.current_map?, self.current_layer?))
    }

    pub fn current_map(&self) -> Option<&Map> {
        self.maps.get(&self.current_map?)
    }

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    pub fn rebuild_index(&mut self) {
        self.index = ContentIndex::rebuild(&self.maps);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub sidebar: ItemRegistry,
    #[serde(default)]
    pub canvas: CanvasState,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: ProjectInfo { name: name.into() },
            ..Default::default()
        }
    }

    /// Effective snap step and offset of `layer` on `map`
    pub fn snap_for(&self, map: ItemId, layer: ItemId) -> (Snap, Coord) {
        let map_snap = self.sidebar.map(map).map(|m| m.snap).unwrap_or_default();
        match self.sidebar.layer(layer) {
            Some(l) => (Snap::resolve(l.snap, map_snap), l.offset),
            None => (map_snap, Coord::ZERO),
        }
    }

    /// Snap step and offset of the current layer, if a map and layer are selected
    pub fn current_snap(&self) -> Option<(Snap, Coord)> {
        let (map, layer) = self.canvas.current()?;
        Some(self.snap_for(map, layer))
    }

    /// Register a new item and create its map-level structures
    pub fn add_item(&mut self, item_type: ItemType, default_snap: Snap) -> ItemId {
        let id = self.sidebar.add(item_type, default_snap).id;
        info!("Added {} {}", item_type, self.sidebar.name_of(id));
        match item_type {
            ItemType::Map => {
                self.add_map(id);
            }
            ItemType::Layer => {
                self.add_layer(id);
            }
            _ => {}
        }
        id
    }

    /// Register an already-built item
    pub fn insert_item(&mut self, item: Item) -> ItemId {
        let item_type = item.item_type();
        let id = self.sidebar.insert(item).id;
        match item_type {
            ItemType::Map => {
                self.add_map(id);
            }
            ItemType::Layer => {
                self.add_layer(id);
            }
            _ => {}
        }
        id
    }

    /// Create the content of a map item and make it current
    pub fn add_map(&mut self, id: ItemId) -> bool {
        let created = !self.canvas.maps.contains_key(&id);
        self.canvas.maps.entry(id).or_default();
        let selected = self.canvas.current_map != Some(id);
        self.canvas.current_map = Some(id);
        if let Some(layer) = self.canvas.current_layer {
            self.ensure_layer(id, layer);
        }
        created || selected
    }

    /// Make a new layer current and register it on the current map
    pub fn add_layer(&mut self, id: ItemId) -> bool {
        self.set_layer(id)
    }

    fn ensure_layer(&mut self, map: ItemId, layer: ItemId) {
        if let Some(content) = self.canvas.maps.get_mut(&map) {
            if !content.has_layer(layer) {
                content.ensure_layer(layer);
                self.canvas.index.record_layer(map, layer);
            }
        }
    }

    /// Switch maps and return the camera stored for the new map
    pub fn set_map(&mut self, id: ItemId) -> Option<Coord> {
        let camera = self.canvas.maps.get(&id)?.camera;
        if self.canvas.current_map != Some(id) {
            self.canvas.current_map = Some(id);
            if let Some(layer) = self.canvas.current_layer {
                self.ensure_layer(id, layer);
            }
        }
        Some(camera)
    }

    pub fn set_layer(&mut self, id: ItemId) -> bool {
        if self.sidebar.layer(id).is_none() {
            return false;
        }
        let changed = self.canvas.current_layer != Some(id);
        self.canvas.current_layer = Some(id);
        if let Some(map) = self.canvas.current_map {
            self.ensure_layer(map, id);
        }
        changed
    }

    /// Persist the camera of the current map
    pub fn set_camera(&mut self, x: i32, y: i32) -> bool {
        let Some(map) = self.canvas.current_map.and_then(|id| self.canvas.maps.get_mut(&id))
        else {
            return false;
        };
        let camera = Coord::new(x, y);
        if map.camera == camera {
            return false;
        }
        map.camera = camera;
        true
    }

    /// Edit an item in place; its id and type are kept
    pub fn update_item(&mut self, id: ItemId, edit: impl FnOnce(&mut Item)) -> bool {
        let Some(item) = self.sidebar.get_mut(id) else {
            return false;
        };
        let before = item.clone();
        edit(item);
        item.id = before.id;
        if item.item_type() != before.item_type() {
            debug!("Refusing to change the type of item {}", id);
            *item = before;
            return false;
        }
        *item != before
    }

    /// Remove an item and everything that depends on it
    pub fn delete_item(&mut self, id: ItemId) -> bool {
        let Some(item_type) = self.sidebar.get(id).map(Item::item_type) else {
            return false;
        };
        match item_type {
            ItemType::Layer => {
                self.remove_layer(id);
            }
            ItemType::Map => {
                self.remove_map(id);
            }
            ItemType::Tileset | ItemType::Node => {
                self.remove_element(id);
            }
            ItemType::Label => {
                self.strip_label(id);
            }
        }
        let removed = self.sidebar.remove(id);
        if let Some(item) = &removed {
            info!("Deleted {} {}", item_type, item.name);
        }
        removed.is_some()
    }

    /// Drop a layer's content from every map.
    ///
    /// When the removed layer was current, another layer of the current map
    /// takes its place (the highest remaining by `z`), or none if the map
    /// has no other layer.
    pub fn remove_layer(&mut self, id: ItemId) -> bool {
        let mut changed = false;
        for map_id in self.canvas.index.maps_with_layer(id) {
            if let Some(map) = self.canvas.maps.get_mut(&map_id) {
                changed |= map.remove_layer(id);
            }
        }
        self.canvas.index.forget_layer(id);
        debug!("Removed layer {} from all maps", id);

        if self.canvas.current_layer == Some(id) {
            let remaining = self.canvas.current_map().map(Map::layer_ids).unwrap_or_default();
            let next = self
                .sidebar
                .layers_by_z()
                .into_iter()
                .rev()
                .map(|(item, _)| item.id)
                .find(|layer| *layer != id && remaining.contains(layer));
            self.canvas.current_layer = next;
            changed = true;
        }
        changed
    }

    pub fn remove_map(&mut self, id: ItemId) -> bool {
        let removed = self.canvas.maps.remove(&id).is_some();
        self.canvas.index.forget_map(id);
        let was_current = self.canvas.current_map == Some(id);
        if was_current {
            self.canvas.current_map = None;
        }
        removed || was_current
    }

    /// Remove every tile or node instance of a tileset or node type, on every map
    pub fn remove_element(&mut self, id: ItemId) -> bool {
        let mut removed = 0;
        for (map_id, layer) in self.canvas.index.cells_with(id) {
            if let Some(map) = self.canvas.maps.get_mut(&map_id) {
                removed += map.remove_tiles_of(layer, id);
                removed += map.remove_nodes_of(layer, id);
            }
        }
        self.canvas.index.forget_element(id);
        if removed > 0 {
            debug!("Removed {} placements of {}", removed, id);
        }
        removed > 0
    }

    /// Append a text field to a label type and return its id
    pub fn add_label_field(&mut self, label_type: ItemId) -> Option<String> {
        Some(self.sidebar.label_type_mut(label_type)?.add_field())
    }

    pub fn remove_label_field(&mut self, label_type: ItemId, field_id: &str) -> bool {
        self.sidebar
            .label_type_mut(label_type)
            .is_some_and(|l| l.remove_field(field_id))
    }

    pub fn rename_label_field(&mut self, label_type: ItemId, field_id: &str, name: &str) -> bool {
        let Some(field) = self
            .sidebar
            .label_type_mut(label_type)
            .and_then(|l| l.field_mut(field_id))
        else {
            return false;
        };
        if field.name == name {
            return false;
        }
        field.name = name.to_string();
        true
    }

    /// Change a field's type; values already entered are kept as they are
    pub fn set_label_field_type(
        &mut self,
        label_type: ItemId,
        field_id: &str,
        field_type: FieldType,
    ) -> bool {
        let Some(field) = self
            .sidebar
            .label_type_mut(label_type)
            .and_then(|l| l.field_mut(field_id))
        else {
            return false;
        };
        let changed = field.field_type != field_type;
        field.field_type = field_type;
        changed
    }

    /// Drop every point label of a label type
    pub fn strip_label(&mut self, label_type: ItemId) -> bool {
        let mut changed = false;
        for map in self.canvas.maps.values_mut() {
            changed |= map.strip_label(label_type);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsmith_core::{
        ItemKind, LabelData, LayerItem, NodeInstance, Point, TileFragment, TileKey, TilePlacement,
    };

    fn layer_item(name: &str, z: i32) -> Item {
        Item::new(name, ItemKind::Layer(LayerItem { z, ..Default::default() }))
    }

    #[test]
    fn test_add_map_creates_content_and_selects() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        assert!(doc.canvas.map(map).is_some());
        assert_eq!(doc.canvas.current_map, Some(map));
        assert_eq!(doc.sidebar.map(map).unwrap().snap, Snap::new(32, 32));
    }

    #[test]
    fn test_add_layer_registers_on_current_map() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let layer = doc.add_item(ItemType::Layer, Snap::default());
        assert_eq!(doc.canvas.current(), Some((map, layer)));
        assert!(doc.canvas.map(map).unwrap().has_layer(layer));
        assert_eq!(doc.canvas.index().maps_with_layer(layer), vec![map]);
    }

    #[test]
    fn test_set_map_restores_camera() {
        let mut doc = Document::new("demo");
        let a = doc.add_item(ItemType::Map, Snap::new(32, 32));
        assert!(doc.set_camera(100, -50));
        let b = doc.add_item(ItemType::Map, Snap::new(32, 32));
        assert_eq!(doc.set_map(b), Some(Coord::ZERO));
        assert_eq!(doc.set_map(a), Some(Coord::new(100, -50)));
        assert!(!doc.set_camera(100, -50));
        assert_eq!(doc.set_map(uuid::Uuid::new_v4()), None);
    }

    #[test]
    fn test_snap_for_falls_back_to_map() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let layer = doc.insert_item(Item::new(
            "l",
            ItemKind::Layer(LayerItem {
                z: 0,
                snap: Snap::new(16, 0),
                offset: Coord::new(4, 4),
            }),
        ));
        assert_eq!(doc.snap_for(map, layer), (Snap::new(16, 32), Coord::new(4, 4)));
        assert_eq!(doc.current_snap(), Some((Snap::new(16, 32), Coord::new(4, 4))));
    }

    #[test]
    fn test_remove_current_layer_picks_layer_on_same_map() {
        let mut doc = Document::new("demo");
        let map_a = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let low = doc.insert_item(layer_item("low", 0));
        let high = doc.insert_item(layer_item("high", 5));
        let map_b = doc.add_item(ItemType::Map, Snap::new(32, 32));
        // only exists on map b
        let other = doc.insert_item(layer_item("other", 9));
        doc.set_layer(low);
        doc.set_map(map_a);

        assert!(doc.delete_item(low));
        assert_eq!(doc.canvas.current_layer, Some(high));
        assert!(!doc.canvas.map(map_a).unwrap().has_layer(low));
        assert!(doc.canvas.map(map_b).unwrap().has_layer(other));

        doc.delete_item(high);
        assert_eq!(doc.canvas.current_layer, None);
    }

    #[test]
    fn test_delete_layer_cascades_to_every_map() {
        let mut doc = Document::new("demo");
        let map_a = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let layer = doc.add_item(ItemType::Layer, Snap::default());
        let map_b = doc.add_item(ItemType::Map, Snap::new(32, 32));
        assert!(doc.canvas.map(map_b).unwrap().has_layer(layer));

        doc.delete_item(layer);
        assert!(!doc.canvas.map(map_a).unwrap().has_layer(layer));
        assert!(!doc.canvas.map(map_b).unwrap().has_layer(layer));
        assert!(doc.sidebar.get(layer).is_none());
    }

    #[test]
    fn test_delete_map_clears_selection() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        assert!(doc.delete_item(map));
        assert!(doc.canvas.maps.is_empty());
        assert_eq!(doc.canvas.current_map, None);
    }

    #[test]
    fn test_delete_tileset_removes_its_tiles_everywhere() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let layer = doc.add_item(ItemType::Layer, Snap::default());
        let tileset = doc.add_item(ItemType::Tileset, Snap::default());
        let keep = doc.add_item(ItemType::Tileset, Snap::default());
        let content = doc.canvas.maps.get_mut(&map).unwrap();
        content.place([
            TilePlacement::new(layer, tileset, Coord::ZERO, TileFragment::default()),
            TilePlacement::new(layer, keep, Coord::new(32, 0), TileFragment::default()),
        ]);
        // direct edits bypass the index
        doc.canvas.rebuild_index();

        assert!(doc.delete_item(tileset));
        let tiles = doc.canvas.map(map).unwrap().tiles_on(layer);
        assert_eq!(tiles.len(), 1);
        assert!(doc.canvas.map(map).unwrap().tile_at(&TileKey::new(layer, 32, 0)).is_some());
    }

    #[test]
    fn test_delete_label_strips_points() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let layer = doc.add_item(ItemType::Layer, Snap::default());
        let label = doc.add_item(ItemType::Label, Snap::default());
        let mut point = Point::new(0, 0);
        point.label = Some(LabelData::new(label, std::iter::empty()));
        doc.canvas
            .maps
            .get_mut(&map)
            .unwrap()
            .push_node(layer, NodeInstance::new(uuid::Uuid::new_v4(), vec![point]));

        assert!(doc.delete_item(label));
        let node = &doc.canvas.map(map).unwrap().nodes_on(layer)[0];
        assert!(node.node.points[0].label.is_none());
    }

    #[test]
    fn test_update_item_keeps_identity() {
        let mut doc = Document::new("demo");
        let layer = doc.add_item(ItemType::Layer, Snap::default());
        assert!(doc.update_item(layer, |item| {
            item.name = "ground".to_string();
            item.id = uuid::Uuid::new_v4();
        }));
        assert_eq!(doc.sidebar.name_of(layer), "ground");
        assert!(!doc.update_item(layer, |item| item.kind = ItemKind::Map(Default::default())));
        assert!(doc.sidebar.layer(layer).is_some());
        assert!(!doc.update_item(layer, |_| {}));
    }

    #[test]
    fn test_index_ignored_by_equality() {
        let mut doc = Document::new("demo");
        doc.add_item(ItemType::Map, Snap::new(32, 32));
        doc.add_item(ItemType::Layer, Snap::default());
        let mut copy = doc.clone();
        copy.canvas.index = ContentIndex::new();
        assert_eq!(copy, doc);
    }

    #[test]
    fn test_deserialized_document_cascades_deletes() {
        let mut doc = Document::new("demo");
        let map = doc.add_item(ItemType::Map, Snap::new(32, 32));
        let layer = doc.add_item(ItemType::Layer, Snap::default());
        let tileset = doc.add_item(ItemType::Tileset, Snap::default());
        let selection = mapsmith_core::TileSelection::new(tileset, vec![TileFragment::default()]);
        assert!(doc.place_tiles(&[Coord::ZERO], &selection));

        let json = serde_json::to_string(&doc).unwrap();
        let mut loaded: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.canvas.index().maps_with_layer(layer), vec![map]);
        assert!(loaded.delete_item(tileset));
        assert!(loaded.canvas.map(map).unwrap().tiles_on(layer).is_empty());
        assert!(loaded.delete_item(layer));
        assert!(!loaded.canvas.map(map).unwrap().has_layer(layer));
    }

    #[test]
    fn test_label_field_editing() {
        let mut doc = Document::new("demo");
        let label = doc.add_item(ItemType::Label, Snap::default());
        let field = doc.add_label_field(label).unwrap();
        assert!(doc.rename_label_field(label, &field, "health"));
        assert!(!doc.rename_label_field(label, &field, "health"));
        assert!(doc.set_label_field_type(label, &field, FieldType::Number));
        let def = doc.sidebar.label_type(label).unwrap().field(&field).unwrap();
        assert_eq!(def.name, "health");
        assert_eq!(def.field_type, FieldType::Number);
        assert!(doc.remove_label_field(label, &field));
        assert!(!doc.remove_label_field(label, &field));
        assert_eq!(doc.add_label_field(uuid::Uuid::new_v4()), None);
    }
}
