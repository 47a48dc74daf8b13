//! Item registry (the sidebar's list of authorable things)

use crate::item::{
    Item, ItemId, ItemKind, ItemType, LabelTypeItem, LayerItem, MapItem, NodeTypeItem, TilesetItem,
};
use crate::Snap;
use serde::{Deserialize, Serialize};

/// Owns every item; everything else refers to items by id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemRegistry {
    #[serde(default)]
    pub items: Vec<Item>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new item of `item_type` with a fresh id and a unique default name
    pub fn add(&mut self, item_type: ItemType, default_snap: Snap) -> &Item {
        let name = self.unique_name(item_type.as_str());
        let item = Item::new(name, ItemKind::default_for(item_type, default_snap));
        self.insert(item)
    }

    /// Register an already-built item
    pub fn insert(&mut self, item: Item) -> &Item {
        self.items.push(item);
        let last = self.items.len() - 1;
        &self.items[last]
    }

    /// First free `<prefix><n>` name
    pub fn unique_name(&self, prefix: &str) -> String {
        let mut num = 0;
        loop {
            let candidate = format!("{prefix}{num}");
            if !self.items.iter().any(|i| i.name == candidate) {
                return candidate;
            }
            num += 1;
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Remove an item by id
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Items of one type in registration order
    pub fn of_type(&self, item_type: ItemType) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |i| i.item_type() == item_type)
    }

    pub fn map(&self, id: ItemId) -> Option<&MapItem> {
        match &self.get(id)?.kind {
            ItemKind::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn layer(&self, id: ItemId) -> Option<&LayerItem> {
        match &self.get(id)?.kind {
            ItemKind::Layer(l) => Some(l),
            _ => None,
        }
    }

    pub fn tileset(&self, id: ItemId) -> Option<&TilesetItem> {
        match &self.get(id)?.kind {
            ItemKind::Tileset(t) => Some(t),
            _ => None,
        }
    }

    pub fn node_type(&self, id: ItemId) -> Option<&NodeTypeItem> {
        match &self.get(id)?.kind {
            ItemKind::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn label_type(&self, id: ItemId) -> Option<&LabelTypeItem> {
        match &self.get(id)?.kind {
            ItemKind::Label(l) => Some(l),
            _ => None,
        }
    }

    pub fn label_type_mut(&mut self, id: ItemId) -> Option<&mut LabelTypeItem> {
        match &mut self.get_mut(id)?.kind {
            ItemKind::Label(l) => Some(l),
            _ => None,
        }
    }

    /// Display name of an item, empty if unknown
    pub fn name_of(&self, id: ItemId) -> &str {
        self.get(id).map(|i| i.name.as_str()).unwrap_or("")
    }

    /// Layers sorted by ascending `z`, ties kept in registration order
    pub fn layers_by_z(&self) -> Vec<(&Item, &LayerItem)> {
        let mut layers: Vec<(&Item, &LayerItem)> = self
            .items
            .iter()
            .filter_map(|i| match &i.kind {
                ItemKind::Layer(l) => Some((i, l)),
                _ => None,
            })
            .collect();
        layers.sort_by_key(|(_, l)| l.z);
        layers
    }
}
