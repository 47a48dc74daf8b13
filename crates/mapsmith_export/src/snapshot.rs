//! Owned copy of everything an export reads
//!
//! Captured synchronously from the live document so that image probing
//! and file writes never observe later edits.

use mapsmith_core::{
    ConnectType, Coord, ItemId, ItemKind, ItemRegistry, LabelTypeItem, Map, Snap, TilesetItem,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    pub id: ItemId,
    pub name: String,
    pub snap: Snap,
    pub content: Map,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub id: ItemId,
    pub name: String,
    pub z: i32,
    pub snap: Snap,
    pub offset: Coord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetSnapshot {
    pub id: ItemId,
    pub name: String,
    pub tileset: TilesetItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeSnapshot {
    pub name: String,
    pub connect_type: ConnectType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportSnapshot {
    pub maps: Vec<MapSnapshot>,
    /// Sorted by ascending `z`
    pub layers: Vec<LayerSnapshot>,
    /// In registry order, which fixes gid allocation
    pub tilesets: Vec<TilesetSnapshot>,
    pub node_types: BTreeMap<ItemId, NodeTypeSnapshot>,
    pub label_types: BTreeMap<ItemId, LabelTypeItem>,
}

impl ExportSnapshot {
    pub fn capture(registry: &ItemRegistry, maps: &BTreeMap<ItemId, Map>) -> Self {
        let mut snapshot = ExportSnapshot::default();
        for item in registry.iter() {
            match &item.kind {
                ItemKind::Map(settings) => {
                    if let Some(content) = maps.get(&item.id) {
                        snapshot.maps.push(MapSnapshot {
                            id: item.id,
                            name: item.name.clone(),
                            snap: settings.snap,
                            content: content.clone(),
                        });
                    }
                }
                ItemKind::Tileset(tileset) => snapshot.tilesets.push(TilesetSnapshot {
                    id: item.id,
                    name: item.name.clone(),
                    tileset: tileset.clone(),
                }),
                ItemKind::Node(node) => {
                    snapshot.node_types.insert(
                        item.id,
                        NodeTypeSnapshot {
                            name: item.name.clone(),
                            connect_type: node.connect_type,
                        },
                    );
                }
                ItemKind::Label(label) => {
                    snapshot.label_types.insert(item.id, label.clone());
                }
                ItemKind::Layer(_) => {}
            }
        }
        snapshot.layers = registry
            .layers_by_z()
            .into_iter()
            .map(|(item, layer)| LayerSnapshot {
                id: item.id,
                name: item.name.clone(),
                z: layer.z,
                snap: layer.snap,
                offset: layer.offset,
            })
            .collect();
        snapshot
    }
}
