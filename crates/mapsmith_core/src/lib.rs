//! Core data structures for mapsmith
//!
//! This crate provides the types the editor and exporter share:
//! - `Coord`, `Snap` - Pixel positions and grid snapping
//! - `Item` - Registry entries (maps, layers, tilesets, node types, label types)
//! - `Map` - Tile placements and node instances per layer
//! - `NodeGeometry` - Point/edge topology of a node
//! - `ContentIndex` - Reverse lookup used by cascade deletions
//! - `Value` - Label field value type

mod geometry;
mod index;
mod item;
mod map;
mod node;
mod registry;
mod value;

pub use geometry::{fill_anchors, snap, snap_axis, Bounds, Coord, GeometryError, Snap};
pub use index::ContentIndex;
pub use item::{
    ConnectType, Crop, FieldType, FrameSize, Item, ItemId, ItemKind, ItemType, LabelField,
    LabelTypeItem, LayerItem, MapItem, NodeTypeItem, TilesetItem,
};
pub use map::{Map, TileFragment, TileKey, TileKeyError, TilePlacement, TileSelection};
pub use node::{same_edge, Edge, LabelData, NodeGeometry, NodeInstance, Point};
pub use registry::ItemRegistry;
pub use value::Value;
