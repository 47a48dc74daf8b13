//! Reverse index from layers and elements to the maps that hold them
//!
//! Entries are only ever added during edits, so the index is a superset of
//! the real content until the next [`ContentIndex::rebuild`]. Cascade
//! deletions visit the indexed maps instead of scanning every map.

use crate::map::Map;
use crate::ItemId;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    layers: BTreeMap<ItemId, BTreeSet<ItemId>>,
    elements: BTreeMap<ItemId, BTreeSet<(ItemId, ItemId)>>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every layer and element of `maps`
    pub fn rebuild(maps: &BTreeMap<ItemId, Map>) -> Self {
        let mut index = Self::new();
        for (map_id, map) in maps {
            for layer in map.layer_ids() {
                index.record_layer(*map_id, layer);
            }
            for (layer, tiles) in &map.tiles {
                for tile in tiles.iter() {
                    index.record_element(*map_id, *layer, tile.id);
                }
            }
            for (layer, nodes) in &map.nodes {
                for node in nodes.iter() {
                    index.record_element(*map_id, *layer, node.id);
                }
            }
        }
        index
    }

    pub fn record_layer(&mut self, map: ItemId, layer: ItemId) {
        self.layers.entry(layer).or_default().insert(map);
    }

    /// Note that element `id` (tileset or node type) appears on `map`/`layer`
    pub fn record_element(&mut self, map: ItemId, layer: ItemId, id: ItemId) {
        self.record_layer(map, layer);
        self.elements.entry(id).or_default().insert((map, layer));
    }

    /// Maps that may hold content for `layer`
    pub fn maps_with_layer(&self, layer: ItemId) -> Vec<ItemId> {
        self.layers
            .get(&layer)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// `(map, layer)` pairs that may hold element `id`
    pub fn cells_with(&self, id: ItemId) -> Vec<(ItemId, ItemId)> {
        self.elements
            .get(&id)
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn forget_layer(&mut self, layer: ItemId) {
        self.layers.remove(&layer);
        for cells in self.elements.values_mut() {
            cells.retain(|(_, l)| *l != layer);
        }
    }

    pub fn forget_map(&mut self, map: ItemId) {
        for maps in self.layers.values_mut() {
            maps.remove(&map);
        }
        for cells in self.elements.values_mut() {
            cells.retain(|(m, _)| *m != map);
        }
    }

    pub fn forget_element(&mut self, id: ItemId) {
        self.elements.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TilePlacement;
    use crate::node::{NodeInstance, Point};
    use crate::{Coord, TileFragment};
    use uuid::Uuid;

    #[test]
    fn test_rebuild_covers_tiles_and_nodes() {
        let (map_id, layer, tileset, kind) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut map = Map::new();
        map.place([TilePlacement::new(layer, tileset, Coord::ZERO, TileFragment::default())]);
        map.push_node(layer, NodeInstance::new(kind, vec![Point::new(0, 0)]));
        let maps = BTreeMap::from([(map_id, map)]);

        let index = ContentIndex::rebuild(&maps);
        assert_eq!(index.maps_with_layer(layer), vec![map_id]);
        assert_eq!(index.cells_with(tileset), vec![(map_id, layer)]);
        assert_eq!(index.cells_with(kind), vec![(map_id, layer)]);
        assert!(index.cells_with(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_forget() {
        let (m1, m2, layer, id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut index = ContentIndex::new();
        index.record_element(m1, layer, id);
        index.record_element(m2, layer, id);

        index.forget_map(m1);
        assert_eq!(index.maps_with_layer(layer), vec![m2]);
        assert_eq!(index.cells_with(id), vec![(m2, layer)]);

        index.forget_layer(layer);
        assert!(index.maps_with_layer(layer).is_empty());
        assert!(index.cells_with(id).is_empty());
    }
}
