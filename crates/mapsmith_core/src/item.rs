//! Registry items: maps, layers, tilesets, node types and label types

use crate::{Coord, Snap, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of any registry item
pub type ItemId = Uuid;

/// An addressable authorable thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }
}

/// Discriminant of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Map,
    Layer,
    Tileset,
    Node,
    Label,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Map => "map",
            ItemType::Layer => "layer",
            ItemType::Tileset => "tileset",
            ItemType::Node => "node",
            ItemType::Label => "label",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Map(MapItem),
    Layer(LayerItem),
    Tileset(TilesetItem),
    Node(NodeTypeItem),
    Label(LabelTypeItem),
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Map(_) => ItemType::Map,
            ItemKind::Layer(_) => ItemType::Layer,
            ItemKind::Tileset(_) => ItemType::Tileset,
            ItemKind::Node(_) => ItemType::Node,
            ItemKind::Label(_) => ItemType::Label,
        }
    }

    /// Default payload for a freshly added item of the given type
    pub fn default_for(item_type: ItemType, default_snap: Snap) -> Self {
        match item_type {
            ItemType::Map => ItemKind::Map(MapItem { snap: default_snap }),
            ItemType::Layer => ItemKind::Layer(LayerItem::default()),
            ItemType::Tileset => ItemKind::Tileset(TilesetItem::default()),
            ItemType::Node => ItemKind::Node(NodeTypeItem::default()),
            ItemType::Label => ItemKind::Label(LabelTypeItem::default()),
        }
    }
}

/// Map settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapItem {
    /// Default grid step for layers without their own
    #[serde(default)]
    pub snap: Snap,
}

/// Layer settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerItem {
    /// Depth; lower values are drawn first
    #[serde(default)]
    pub z: i32,
    /// Per-axis override of the map snap (0 = inherit)
    #[serde(default)]
    pub snap: Snap,
    #[serde(default)]
    pub offset: Coord,
}

/// Frame size of a tileset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameSize {
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
}

/// Crop rectangle applied to a tileset image (0 width/height = to the image edge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Crop {
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
}

/// Tileset settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TilesetItem {
    /// Path to the source image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub size: FrameSize,
    #[serde(default)]
    pub crop: Crop,
}

impl TilesetItem {
    /// Image area left after cropping
    pub fn cropped_size(&self, image_w: u32, image_h: u32) -> (u32, u32) {
        let w = if self.crop.w > 0 {
            self.crop.w
        } else {
            image_w.saturating_sub(self.crop.x)
        };
        let h = if self.crop.h > 0 {
            self.crop.h
        } else {
            image_h.saturating_sub(self.crop.y)
        };
        (w, h)
    }

    /// Number of frames the cropped image holds (partial frames count)
    pub fn tile_count(&self, image_w: u32, image_h: u32) -> u32 {
        if self.size.w == 0 || self.size.h == 0 {
            return 0;
        }
        let (w, h) = self.cropped_size(image_w, image_h);
        w.div_ceil(self.size.w) * h.div_ceil(self.size.h)
    }

    /// Whole frames per row of the source image
    pub fn columns(&self, image_w: u32) -> u32 {
        if self.size.w == 0 {
            0
        } else {
            image_w / self.size.w
        }
    }

    /// Index of the frame at source pixel `(x, y)` within this tileset
    pub fn tile_index(&self, x: u32, y: u32, image_w: u32) -> Option<u32> {
        if self.size.w == 0 || self.size.h == 0 {
            return None;
        }
        let row = y / self.size.h;
        let col = x / self.size.w;
        row.checked_mul(self.columns(image_w))?.checked_add(col)
    }
}

/// Topology policy of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectType {
    /// Isolated single points
    #[default]
    None,
    /// Ordered polyline
    Path,
    /// Arbitrary edge set
    Graph,
}

impl ConnectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectType::None => "none",
            ConnectType::Path => "path",
            ConnectType::Graph => "graph",
        }
    }
}

/// Node type definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeTypeItem {
    #[serde(default)]
    pub connect_type: ConnectType,
}

/// Type of a label field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    #[default]
    Text,
    Checkbox,
    Array,
}

impl FieldType {
    /// Coerce raw form input into a value of this type
    pub fn parse(&self, raw: &str) -> Value {
        match self {
            FieldType::Number => match raw.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Value::Float(n),
                _ => Value::Null,
            },
            FieldType::Array => Value::Array(
                raw.split(',')
                    .map(|v| Value::String(v.trim().to_string()))
                    .collect(),
            ),
            FieldType::Checkbox => {
                Value::Bool(matches!(raw.trim(), "true" | "on" | "1" | "checked"))
            }
            FieldType::Text => Value::String(raw.to_string()),
        }
    }
}

/// A field of a label type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelField {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

/// Label type definition: an ordered list of typed fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelTypeItem {
    #[serde(default)]
    pub fields: Vec<LabelField>,
}

impl LabelTypeItem {
    /// Append a new text field and return its id
    pub fn add_field(&mut self) -> String {
        let id = loop {
            let candidate = Uuid::new_v4().simple().to_string()[..8].to_string();
            if self.field(&candidate).is_none() {
                break candidate;
            }
        };
        self.fields.push(LabelField {
            id: id.clone(),
            name: String::new(),
            field_type: FieldType::Text,
        });
        id
    }

    pub fn remove_field(&mut self, id: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id != id);
        self.fields.len() != before
    }

    pub fn field(&self, id: &str) -> Option<&LabelField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut LabelField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.id.as_str())
    }
}
