//! Exported map document, laid out like a Tiled infinite map

use crate::chunk::Chunk;
use crate::gid::TilesetRange;
use mapsmith_core::Value;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FORMAT_VERSION: &str = "1.5";
pub const LUA_VERSION: &str = "5.1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDocument {
    pub version: &'static str,
    pub luaversion: &'static str,
    pub orientation: &'static str,
    pub renderorder: &'static str,
    pub infinite: bool,
    pub width: u32,
    pub height: u32,
    pub tilewidth: i32,
    pub tileheight: i32,
    pub nextlayerid: u32,
    pub nextobjectid: u32,
    pub properties: BTreeMap<String, Value>,
    pub tilesets: Vec<TilesetEntry>,
    pub layers: Vec<LayerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilesetEntry {
    pub name: String,
    pub firstgid: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub spacing: u32,
    pub margin: u32,
    pub columns: u32,
    pub image: String,
    pub imagewidth: u32,
    pub imageheight: u32,
    pub tilecount: u32,
}

impl From<&TilesetRange> for TilesetEntry {
    fn from(range: &TilesetRange) -> Self {
        Self {
            name: range.name.clone(),
            firstgid: range.firstgid,
            tilewidth: range.tilewidth,
            tileheight: range.tileheight,
            spacing: 0,
            margin: 0,
            columns: range.columns,
            image: range.image.clone(),
            imagewidth: range.imagewidth,
            imageheight: range.imageheight,
            tilecount: range.tilecount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerEntry {
    Tilelayer(TileLayer),
    Objectgroup(ObjectGroup),
}

impl LayerEntry {
    pub fn name(&self) -> &str {
        match self {
            LayerEntry::Tilelayer(l) => &l.name,
            LayerEntry::Objectgroup(g) => &g.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub id: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub offsetx: i32,
    pub offsety: i32,
    pub visible: bool,
    pub opacity: f64,
    pub encoding: &'static str,
    pub properties: BTreeMap<String, Value>,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectGroup {
    pub id: u32,
    pub name: String,
    pub draworder: &'static str,
    pub visible: bool,
    pub opacity: f64,
    pub properties: BTreeMap<String, Value>,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Point,
    Polyline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Xy {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub rotation: u32,
    pub visible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub polyline: Vec<Xy>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<[Xy; 2]>,
    pub properties: BTreeMap<String, Value>,
}
