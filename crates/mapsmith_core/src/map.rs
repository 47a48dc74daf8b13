//! Per-map tile and node storage

use crate::geometry::{Bounds, Coord, Snap};
use crate::node::NodeInstance;
use crate::ItemId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// A rectangle cut out of a tileset image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileFragment {
    /// Source image path
    pub path: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Fragments picked from one tileset, as provided by the tileset browser
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileSelection {
    pub tileset: ItemId,
    pub fragments: Vec<TileFragment>,
}

impl TileSelection {
    pub fn new(tileset: ItemId, fragments: Vec<TileFragment>) -> Self {
        Self { tileset, fragments }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Each fragment with its offset from the selection's bounding minimum.
    ///
    /// Frames smaller than the snap `step` are spread out to one cell each,
    /// so no two fragments of a stamp land in the same cell.
    pub fn layout(&self, step: Snap) -> Vec<(Coord, &TileFragment)> {
        let Some(min_x) = self.fragments.iter().map(|f| f.x).min() else {
            return Vec::new();
        };
        let min_y = self.fragments.iter().map(|f| f.y).min().unwrap_or(0);
        self.fragments
            .iter()
            .map(|f| {
                let dx = spread(f.x - min_x, f.w, step.x);
                let dy = spread(f.y - min_y, f.h, step.y);
                (Coord::new(dx, dy), f)
            })
            .collect()
    }

    /// Size of the stamp's bounding box as laid out by [`layout`](Self::layout)
    pub fn extent(&self, step: Snap) -> (i32, i32) {
        let layout = self.layout(step);
        let w = layout
            .iter()
            .map(|(at, f)| at.x.saturating_add(stride(f.w, step.x)))
            .max()
            .unwrap_or(0);
        let h = layout
            .iter()
            .map(|(at, f)| at.y.saturating_add(stride(f.h, step.y)))
            .max()
            .unwrap_or(0);
        (w, h)
    }
}

fn clamp_i32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

/// Space one fragment takes along an axis
fn stride(frame: u32, step: i32) -> i32 {
    clamp_i32(frame).max(step)
}

/// Pixel offset of a fragment `delta` pixels from the stamp origin
fn spread(delta: u32, frame: u32, step: i32) -> i32 {
    let frame = clamp_i32(frame);
    if frame > 0 && step > frame {
        (clamp_i32(delta) / frame).saturating_mul(step)
    } else {
        clamp_i32(delta)
    }
}

/// Unique position of a tile: `(layer, x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub layer: ItemId,
    pub x: i32,
    pub y: i32,
}

impl TileKey {
    pub fn new(layer: ItemId, x: i32, y: i32) -> Self {
        Self { layer, x, y }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.layer, self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tile key '{0}'")]
pub struct TileKeyError(pub String);

impl FromStr for TileKey {
    type Err = TileKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TileKeyError(s.to_string());
        let mut parts = s.rsplitn(3, ',');
        let y = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let x = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let layer = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        Ok(Self { layer, x, y })
    }
}

impl Serialize for TileKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TileKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A tileset fragment anchored at a map cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub key: TileKey,
    /// Tileset item
    pub id: ItemId,
    pub x: i32,
    pub y: i32,
    pub fragment: TileFragment,
}

impl TilePlacement {
    pub fn new(layer: ItemId, tileset: ItemId, at: Coord, fragment: TileFragment) -> Self {
        Self {
            key: TileKey::new(layer, at.x, at.y),
            id: tileset,
            x: at.x,
            y: at.y,
            fragment,
        }
    }

    pub fn layer(&self) -> ItemId {
        self.key.layer
    }
}

/// Content of one map.
///
/// Layer vectors sit behind `Arc` so cloning a map for history shares
/// every layer that a later mutation does not touch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Map {
    #[serde(default)]
    pub camera: Coord,
    #[serde(default)]
    pub tiles: BTreeMap<ItemId, Arc<Vec<TilePlacement>>>,
    #[serde(default)]
    pub nodes: BTreeMap<ItemId, Arc<Vec<NodeInstance>>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register empty tile and node entries for `layer`
    pub fn ensure_layer(&mut self, layer: ItemId) {
        self.tiles.entry(layer).or_default();
        self.nodes.entry(layer).or_default();
    }

    pub fn has_layer(&self, layer: ItemId) -> bool {
        self.tiles.contains_key(&layer) || self.nodes.contains_key(&layer)
    }

    /// Every layer with an entry on this map
    pub fn layer_ids(&self) -> BTreeSet<ItemId> {
        self.tiles.keys().chain(self.nodes.keys()).copied().collect()
    }

    pub fn tiles_on(&self, layer: ItemId) -> &[TilePlacement] {
        self.tiles.get(&layer).map(|t| t.as_slice()).unwrap_or(&[])
    }

    pub fn nodes_on(&self, layer: ItemId) -> &[NodeInstance] {
        self.nodes.get(&layer).map(|n| n.as_slice()).unwrap_or(&[])
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.values().map(|t| t.len()).sum()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.values().map(|n| n.len()).sum()
    }

    /// Write placements, replacing any occupant of the same key.
    ///
    /// Later entries in `placements` win over earlier ones.
    pub fn place(&mut self, placements: impl IntoIterator<Item = TilePlacement>) -> usize {
        let mut count = 0;
        for placement in placements {
            let layer = Arc::make_mut(self.tiles.entry(placement.layer()).or_default());
            layer.retain(|t| t.key != placement.key);
            layer.push(placement);
            count += 1;
        }
        count
    }

    pub fn tile_at(&self, key: &TileKey) -> Option<&TilePlacement> {
        self.tiles_on(key.layer).iter().find(|t| t.key == *key)
    }

    pub fn remove_tile(&mut self, key: &TileKey) -> bool {
        if self.tile_at(key).is_none() {
            return false;
        }
        if let Some(layer) = self.tiles.get_mut(&key.layer) {
            Arc::make_mut(layer).retain(|t| t.key != *key);
        }
        true
    }

    /// Remove every tile on `layer` whose anchor lies within `bounds`
    pub fn remove_tiles_in(&mut self, layer: ItemId, bounds: Bounds) -> usize {
        let hit = |t: &TilePlacement| bounds.contains(Coord::new(t.x, t.y));
        let count = self.tiles_on(layer).iter().filter(|t| hit(t)).count();
        if count > 0 {
            if let Some(tiles) = self.tiles.get_mut(&layer) {
                Arc::make_mut(tiles).retain(|t| !hit(t));
            }
        }
        count
    }

    /// Locate a node instance by key
    pub fn find_node(&self, key: uuid::Uuid) -> Option<(ItemId, &NodeInstance)> {
        self.nodes
            .iter()
            .find_map(|(layer, nodes)| nodes.iter().find(|n| n.key == key).map(|n| (*layer, n)))
    }

    pub fn push_node(&mut self, layer: ItemId, node: NodeInstance) {
        Arc::make_mut(self.nodes.entry(layer).or_default()).push(node);
    }

    /// Drop the instance with `node.key` and append `node` in its place
    pub fn replace_node(&mut self, node: NodeInstance) -> bool {
        let Some((layer, _)) = self.find_node(node.key) else {
            return false;
        };
        if let Some(nodes) = self.nodes.get_mut(&layer) {
            let nodes = Arc::make_mut(nodes);
            nodes.retain(|n| n.key != node.key);
            nodes.push(node);
        }
        true
    }

    pub fn remove_node(&mut self, key: uuid::Uuid) -> Option<NodeInstance> {
        let (layer, _) = self.find_node(key)?;
        let nodes = Arc::make_mut(self.nodes.get_mut(&layer)?);
        let pos = nodes.iter().position(|n| n.key == key)?;
        Some(nodes.remove(pos))
    }

    /// Drop a layer's tiles and nodes
    pub fn remove_layer(&mut self, layer: ItemId) -> bool {
        let tiles = self.tiles.remove(&layer).is_some();
        let nodes = self.nodes.remove(&layer).is_some();
        tiles || nodes
    }

    /// Remove every tile of tileset `id` on `layer`
    pub fn remove_tiles_of(&mut self, layer: ItemId, id: ItemId) -> usize {
        let count = self.tiles_on(layer).iter().filter(|t| t.id == id).count();
        if count > 0 {
            if let Some(tiles) = self.tiles.get_mut(&layer) {
                Arc::make_mut(tiles).retain(|t| t.id != id);
            }
        }
        count
    }

    /// Remove every instance of node type `id` on `layer`
    pub fn remove_nodes_of(&mut self, layer: ItemId, id: ItemId) -> usize {
        let count = self.nodes_on(layer).iter().filter(|n| n.id == id).count();
        if count > 0 {
            if let Some(nodes) = self.nodes.get_mut(&layer) {
                Arc::make_mut(nodes).retain(|n| n.id != id);
            }
        }
        count
    }

    /// Drop labels of `label_type` from every point on this map
    pub fn strip_label(&mut self, label_type: ItemId) -> bool {
        let mut changed = false;
        for nodes in self.nodes.values_mut() {
            let carries = nodes.iter().any(|n| {
                n.node
                    .points
                    .iter()
                    .any(|p| p.label.as_ref().map(|l| l.label_type) == Some(label_type))
            });
            if carries {
                for node in Arc::make_mut(nodes) {
                    changed |= node.node.strip_label(label_type);
                }
            }
        }
        changed
    }
}
