//! Tile and node operations on the current map

use crate::document::Document;
use mapsmith_core::{
    snap, Bounds, ConnectType, Coord, ItemId, LabelData, NodeInstance, Point, Snap, TileKey,
    TilePlacement, TileSelection,
};
use tracing::debug;
use uuid::Uuid;

impl Document {
    /// Stamp `selection` at every anchor on the current map and layer.
    ///
    /// Anchors are snapped first; each fragment keeps its offset from the
    /// selection's top-left corner, one snap cell per fragment at least.
    /// Occupied keys are overwritten.
    pub fn place_tiles(&mut self, anchors: &[Coord], selection: &TileSelection) -> bool {
        if selection.is_empty() || anchors.is_empty() {
            return false;
        }
        let Some((map_id, layer)) = self.canvas.current() else {
            return false;
        };
        let (step, offset) = self.snap_for(map_id, layer);
        let layout = selection.layout(step);
        let placements: Vec<TilePlacement> = anchors
            .iter()
            .flat_map(|anchor| {
                let origin = snap(*anchor, step, offset);
                layout.iter().map(move |(delta, fragment)| {
                    let at = origin.offset(delta.x as i64, delta.y as i64);
                    TilePlacement::new(layer, selection.tileset, at, (*fragment).clone())
                })
            })
            .collect();

        let Some(map) = self.canvas.maps.get_mut(&map_id) else {
            return false;
        };
        let placed = map.place(placements);
        self.canvas.index.record_element(map_id, layer, selection.tileset);
        debug!("Placed {} tiles", placed);
        placed > 0
    }

    pub fn delete_tile(&mut self, key: &TileKey) -> bool {
        let Some(map) = self.canvas.current_map.and_then(|id| self.canvas.maps.get_mut(&id))
        else {
            return false;
        };
        map.remove_tile(key)
    }

    /// Remove every tile of the current layer inside the dragged rectangle.
    ///
    /// Both corners are snapped so a partially covered cell counts.
    pub fn delete_tile_area(&mut self, start: Coord, end: Coord) -> bool {
        let Some((map_id, layer)) = self.canvas.current() else {
            return false;
        };
        let (step, offset) = self.snap_for(map_id, layer);
        let bounds = Bounds::from_corners(snap(start, step, offset), snap(end, step, offset));
        let Some(map) = self.canvas.maps.get_mut(&map_id) else {
            return false;
        };
        let removed = map.remove_tiles_in(layer, bounds);
        if removed > 0 {
            debug!("Removed {} tiles", removed);
        }
        removed > 0
    }

    /// Add a node instance to the current map and layer
    pub fn commit_node(&mut self, node_type: ItemId, points: Vec<Point>) -> Option<Uuid> {
        if points.is_empty() || self.sidebar.node_type(node_type).is_none() {
            return None;
        }
        let (map_id, layer) = self.canvas.current()?;
        let map = self.canvas.maps.get_mut(&map_id)?;
        let instance = NodeInstance::new(node_type, points);
        let key = instance.key;
        map.push_node(layer, instance);
        self.canvas.index.record_element(map_id, layer, node_type);
        debug!("Committed node {} ({})", key, self.sidebar.name_of(node_type));
        Some(key)
    }

    /// Node instance `key` on the current map, with the layer it lives on
    pub fn find_node(&self, key: Uuid) -> Option<(ItemId, &NodeInstance)> {
        self.canvas.current_map()?.find_node(key)
    }

    /// Connect type of the node instance `key`
    pub fn connect_type_of(&self, key: Uuid) -> Option<ConnectType> {
        let (_, node) = self.find_node(key)?;
        Some(self.sidebar.node_type(node.id)?.connect_type)
    }

    /// Merge an edit into node instance `key`.
    ///
    /// The edited copy replaces the old entry; its key is preserved.
    pub fn update_node(&mut self, key: Uuid, edit: impl FnOnce(&mut NodeInstance)) -> bool {
        self.edit_node(key, |node, _, _| {
            edit(node);
            true
        })
    }

    fn edit_node(
        &mut self,
        key: Uuid,
        edit: impl FnOnce(&mut NodeInstance, Snap, Coord) -> bool,
    ) -> bool {
        let Some(map_id) = self.canvas.current_map else {
            return false;
        };
        let Some((layer, node)) = self.find_node(key) else {
            return false;
        };
        let (step, offset) = self.snap_for(map_id, layer);
        let mut edited = node.clone();
        if !edit(&mut edited, step, offset) {
            return false;
        }
        edited.key = key;
        if edited == *node {
            return false;
        }
        match self.canvas.maps.get_mut(&map_id) {
            Some(map) => map.replace_node(edited),
            None => false,
        }
    }

    pub fn delete_node(&mut self, key: Uuid) -> bool {
        let Some(map) = self.canvas.current_map.and_then(|id| self.canvas.maps.get_mut(&id))
        else {
            return false;
        };
        map.remove_node(key).is_some()
    }

    /// Remove a point and its edges; an instance left without points is deleted
    pub fn delete_node_point(&mut self, key: Uuid, idx: usize) -> bool {
        let Some((_, node)) = self.find_node(key) else {
            return false;
        };
        if idx >= node.node.points.len() {
            return false;
        }
        if node.node.points.len() == 1 {
            return self.delete_node(key);
        }
        self.edit_node(key, |node, _, _| node.node.remove_point(idx).is_some())
    }

    /// Flip the persisted edge `a`-`b` of a graph node
    pub fn toggle_node_edge(&mut self, key: Uuid, a: Coord, b: Coord) -> bool {
        if self.connect_type_of(key) != Some(ConnectType::Graph) {
            return false;
        }
        self.edit_node(key, |node, _, _| node.node.toggle_edge(a, b).is_some())
    }

    /// Append a snapped point to an existing instance.
    ///
    /// Refused when the snapped cell already holds a point.
    pub fn append_node_point(&mut self, key: Uuid, at: Coord) -> bool {
        self.edit_node(key, |node, step, offset| {
            let at = snap(at, step, offset);
            if node.node.contains(at) {
                return false;
            }
            node.node.points.push(Point::from(at));
            true
        })
    }

    pub fn move_node_point(&mut self, key: Uuid, idx: usize, to: Coord) -> bool {
        self.edit_node(key, |node, step, offset| {
            node.node.move_point(idx, snap(to, step, offset))
        })
    }

    /// Split path segment `segment` at its snapped midpoint
    pub fn insert_path_midpoint(&mut self, key: Uuid, segment: usize) -> Option<usize> {
        let mut inserted = None;
        self.edit_node(key, |node, step, offset| {
            inserted = node.node.insert_midpoint(segment, step, offset);
            inserted.is_some()
        });
        inserted
    }

    /// Attach a fresh label of `label_type` to point `idx`, every field null
    pub fn attach_label(&mut self, key: Uuid, idx: usize, label_type: ItemId) -> bool {
        let Some(label) = self
            .sidebar
            .label_type(label_type)
            .map(|l| LabelData::new(label_type, l.field_ids()))
        else {
            return false;
        };
        self.edit_node(key, |node, _, _| match node.node.points.get_mut(idx) {
            Some(point) => {
                point.label = Some(label);
                true
            }
            None => false,
        })
    }

    pub fn clear_label(&mut self, key: Uuid, idx: usize) -> bool {
        self.edit_node(key, |node, _, _| {
            node.node
                .points
                .get_mut(idx)
                .and_then(|p| p.label.take())
                .is_some()
        })
    }

    /// Set a label field from raw input, coerced by the field's declared type
    pub fn set_label_field(&mut self, key: Uuid, idx: usize, field_id: &str, raw: &str) -> bool {
        let Some(label_type) = self
            .find_node(key)
            .and_then(|(_, n)| n.node.points.get(idx))
            .and_then(|p| p.label.as_ref())
            .map(|l| l.label_type)
        else {
            return false;
        };
        let Some(field) = self.sidebar.label_type(label_type).and_then(|l| l.field(field_id))
        else {
            return false;
        };
        let value = field.field_type.parse(raw);
        self.edit_node(key, |node, _, _| {
            match node.node.points.get_mut(idx).and_then(|p| p.label.as_mut()) {
                Some(label) => {
                    label.fields.insert(field_id.to_string(), value);
                    true
                }
                None => false,
            }
        })
    }
}
