//! Chunked map export for mapsmith
//!
//! Converts the sparse editor state into one engine-ready document per map:
//! - `GidTable` - Global tile id ranges per tileset
//! - `build_chunks` - Fixed-size spatial chunks of gids per tile layer
//! - `node_object` - Node instances as point/polyline objects
//! - `to_lua` - Lua `return { ... }` writer (JSON is written with serde_json)
//!
//! # Example
//!
//! ```rust,ignore
//! use mapsmith_export::{export_maps, ExportOptions, ExportSnapshot, FileImageSizes};
//!
//! let snapshot = ExportSnapshot::capture(&registry, &maps);
//! let written = export_maps(&snapshot, &FileImageSizes::new(root), &ExportOptions::default())?;
//! ```

mod chunk;
mod document;
mod error;
mod gid;
mod images;
mod lua;
mod objects;
mod snapshot;

pub use chunk::{build_chunks, extent, Chunk, DEFAULT_CHUNK_SIZE};
pub use document::{
    LayerEntry, MapDocument, MapObject, ObjectGroup, Shape, TileLayer, TilesetEntry, Xy,
    FORMAT_VERSION, LUA_VERSION,
};
pub use error::ExportError;
pub use gid::{GidTable, TilesetRange};
pub use images::{resolve_sizes, FileImageSizes, ImageSizeResolver, ImageSizes, KnownImageSizes};
pub use lua::to_lua;
pub use objects::{node_object, project_label};
pub use snapshot::{ExportSnapshot, LayerSnapshot, MapSnapshot, NodeTypeSnapshot, TilesetSnapshot};

use mapsmith_core::{Snap, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Output encoding of exported maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Lua,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Lua => "lua",
            ExportFormat::Json => "json",
        }
    }

    /// `encoding` of tile layers; chunk data is a plain gid array in both
    pub fn tile_encoding(&self) -> &'static str {
        match self {
            ExportFormat::Lua => "lua",
            ExportFormat::Json => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lua" => Ok(ExportFormat::Lua),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{other}' (expected lua or json)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub chunk_size: u32,
    pub format: ExportFormat,
    /// Directory receiving one file per map
    pub directory: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            format: ExportFormat::Lua,
            directory: PathBuf::from("assets/map"),
        }
    }
}

fn properties<const N: usize>(entries: [(&str, Value); N]) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Build the export document of one map
pub fn build_document(
    map: &MapSnapshot,
    snapshot: &ExportSnapshot,
    gids: &GidTable,
    chunk_size: u32,
    format: ExportFormat,
) -> MapDocument {
    let mut layers: Vec<LayerEntry> = Vec::new();
    let mut groups: BTreeMap<(i32, String), usize> = BTreeMap::new();
    let mut next_layer_id = 1u32;
    let mut next_object_id = 1u32;
    let (mut width, mut height) = (0u32, 0u32);

    for layer in &snapshot.layers {
        let tiles = map.content.tiles_on(layer.id);
        if !tiles.is_empty() {
            let snap = Snap::resolve(layer.snap, map.snap);
            let chunks = build_chunks(tiles, snap, chunk_size, gids);
            let (w, h) = extent(&chunks);
            width = width.max(w);
            height = height.max(h);
            layers.push(LayerEntry::Tilelayer(TileLayer {
                id: next_layer_id,
                name: layer.name.clone(),
                x: 0,
                y: 0,
                width: w,
                height: h,
                offsetx: layer.offset.x,
                offsety: layer.offset.y,
                visible: true,
                opacity: 1.0,
                encoding: format.tile_encoding(),
                properties: properties([("z", Value::Int(layer.z as i64))]),
                chunks,
            }));
            next_layer_id += 1;
        }

        for instance in map.content.nodes_on(layer.id) {
            let Some(node_type) = snapshot.node_types.get(&instance.id) else {
                debug!("Skipping node {} with unknown type {}", instance.key, instance.id);
                continue;
            };
            let Some(object) =
                node_object(instance, node_type, &snapshot.label_types, next_object_id)
            else {
                continue;
            };
            next_object_id += 1;

            let key = (layer.z, node_type.name.clone());
            let idx = match groups.get(&key) {
                Some(&idx) => idx,
                None => {
                    layers.push(LayerEntry::Objectgroup(ObjectGroup {
                        id: next_layer_id,
                        name: node_type.name.clone(),
                        draworder: "topdown",
                        visible: true,
                        opacity: 1.0,
                        properties: properties([
                            ("z", Value::Int(layer.z as i64)),
                            ("connect_type", Value::from(node_type.connect_type.as_str())),
                        ]),
                        objects: Vec::new(),
                    }));
                    next_layer_id += 1;
                    groups.insert(key, layers.len() - 1);
                    layers.len() - 1
                }
            };
            if let Some(LayerEntry::Objectgroup(group)) = layers.get_mut(idx) {
                group.objects.push(object);
            }
        }
    }

    MapDocument {
        version: FORMAT_VERSION,
        luaversion: LUA_VERSION,
        orientation: "orthogonal",
        renderorder: "right-down",
        infinite: true,
        width,
        height,
        tilewidth: map.snap.x,
        tileheight: map.snap.y,
        nextlayerid: next_layer_id,
        nextobjectid: next_object_id,
        properties: properties([("name", Value::from(map.name.as_str()))]),
        tilesets: gids.ranges().iter().map(TilesetEntry::from).collect(),
        layers,
    }
}

/// Encode a document in the requested format
pub fn render(document: &MapDocument, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Lua => to_lua(document),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(document)?),
    }
}

/// File-system safe form of a map name
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "map".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Output paths of several maps, in order.
///
/// Names that sanitize to the same file get a `_<n>` suffix, compared
/// case-insensitively so no two maps share a file on any file system.
pub fn output_paths<'a>(
    directory: &Path,
    map_names: impl IntoIterator<Item = &'a str>,
    format: ExportFormat,
) -> Vec<PathBuf> {
    let mut used: HashSet<String> = HashSet::new();
    map_names
        .into_iter()
        .map(|name| {
            let base = sanitize_file_name(name);
            let mut stem = base.clone();
            let mut n = 2;
            while !used.insert(stem.to_lowercase()) {
                stem = format!("{base}_{n}");
                n += 1;
            }
            directory.join(format!("{}.{}", stem, format.extension()))
        })
        .collect()
}

/// Resolve image sizes and build every map document without touching the output directory
pub fn build_documents(
    snapshot: &ExportSnapshot,
    resolver: &dyn ImageSizeResolver,
    chunk_size: u32,
    format: ExportFormat,
) -> Result<Vec<(String, MapDocument)>, ExportError> {
    let sizes = resolve_sizes(snapshot, resolver)?;
    let gids = GidTable::allocate(&snapshot.tilesets, &sizes);
    Ok(snapshot
        .maps
        .iter()
        .map(|map| {
            let document = build_document(map, snapshot, &gids, chunk_size, format);
            (map.name.clone(), document)
        })
        .collect())
}

/// Export every map of the snapshot, one file per map.
///
/// Returns the written paths in map order.
pub fn export_maps(
    snapshot: &ExportSnapshot,
    resolver: &dyn ImageSizeResolver,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>, ExportError> {
    let documents = build_documents(snapshot, resolver, options.chunk_size, options.format)?;

    std::fs::create_dir_all(&options.directory).map_err(|source| ExportError::CreateDir {
        path: options.directory.clone(),
        source,
    })?;

    let paths = output_paths(
        &options.directory,
        documents.iter().map(|(name, _)| name.as_str()),
        options.format,
    );
    let mut written = Vec::with_capacity(documents.len());
    for ((name, document), path) in documents.iter().zip(paths) {
        let content = render(document, options.format)?;
        std::fs::write(&path, content).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        info!("Exported map '{}' to {}", name, path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsmith_core::{
        ConnectType, Coord, FrameSize, Item, ItemKind, ItemRegistry, ItemType, LayerItem, Map,
        NodeInstance, NodeTypeItem, Point, TileFragment, TilePlacement, TilesetItem,
    };
    use uuid::Uuid;

    struct Fixture {
        registry: ItemRegistry,
        maps: BTreeMap<Uuid, Map>,
        map: Uuid,
        ground: Uuid,
        spawn: Uuid,
    }

    fn fixture() -> Fixture {
        let mut registry = ItemRegistry::new();
        let map = registry.add(ItemType::Map, Snap::new(32, 32)).id;
        let ground = registry
            .insert(Item::new("ground", ItemKind::Layer(LayerItem::default())))
            .id;
        let objects = registry
            .insert(Item::new(
                "objects",
                ItemKind::Layer(LayerItem { z: 1, ..Default::default() }),
            ))
            .id;
        let tileset = registry
            .insert(Item::new(
                "terrain",
                ItemKind::Tileset(TilesetItem {
                    image: Some("terrain.png".to_string()),
                    size: FrameSize { w: 32, h: 32 },
                    ..Default::default()
                }),
            ))
            .id;
        let spawn = registry
            .insert(Item::new(
                "spawn",
                ItemKind::Node(NodeTypeItem { connect_type: ConnectType::Path }),
            ))
            .id;

        let mut content = Map::new();
        let fragment = TileFragment {
            path: "terrain.png".to_string(),
            x: 32,
            y: 0,
            w: 32,
            h: 32,
        };
        content.place([
            TilePlacement::new(ground, tileset, Coord::new(0, 0), fragment.clone()),
            TilePlacement::new(ground, tileset, Coord::new(-32, 0), fragment),
        ]);
        content.push_node(
            objects,
            NodeInstance::new(spawn, vec![Point::new(0, 0), Point::new(32, 0)]),
        );
        content.push_node(objects, NodeInstance::new(spawn, vec![Point::new(64, 64)]));

        Fixture {
            registry,
            maps: BTreeMap::from([(map, content)]),
            map,
            ground,
            spawn,
        }
    }

    fn sizes() -> KnownImageSizes {
        KnownImageSizes::default().with("terrain.png", 64, 64)
    }

    #[test]
    fn test_build_document_layout() {
        let f = fixture();
        let snapshot = ExportSnapshot::capture(&f.registry, &f.maps);
        let documents = build_documents(&snapshot, &sizes(), 16, ExportFormat::Lua).unwrap();
        assert_eq!(documents.len(), 1);
        let (name, doc) = &documents[0];
        assert_eq!(name, "map0");
        assert_eq!((doc.tilewidth, doc.tileheight), (32, 32));
        assert_eq!(doc.tilesets.len(), 1);
        assert_eq!((doc.tilesets[0].firstgid, doc.tilesets[0].tilecount), (1, 4));

        assert_eq!(doc.layers.len(), 2);
        let LayerEntry::Tilelayer(tiles) = &doc.layers[0] else {
            panic!("Expected tile layer first");
        };
        assert_eq!(tiles.name, "ground");
        assert_eq!(tiles.chunks.len(), 2);
        let filled: usize = tiles.chunks.iter().map(Chunk::filled).sum();
        assert_eq!(filled, f.maps[&f.map].tiles_on(f.ground).len());

        let LayerEntry::Objectgroup(group) = &doc.layers[1] else {
            panic!("Expected object group second");
        };
        assert_eq!(group.name, "spawn");
        assert_eq!(group.objects.len(), 2);
        assert_eq!(group.objects[0].shape, Shape::Polyline);
        assert_eq!(group.objects[1].shape, Shape::Point);
        assert_eq!(doc.nextobjectid, 3);
        assert_eq!(doc.nextlayerid, 3);
    }

    #[test]
    fn test_groups_merge_by_depth_and_type() {
        let mut f = fixture();
        // second layer at the same depth as "objects"
        let twin = f
            .registry
            .insert(Item::new(
                "twin",
                ItemKind::Layer(LayerItem { z: 1, ..Default::default() }),
            ))
            .id;
        f.maps
            .get_mut(&f.map)
            .unwrap()
            .push_node(twin, NodeInstance::new(f.spawn, vec![Point::new(0, 96)]));

        let snapshot = ExportSnapshot::capture(&f.registry, &f.maps);
        let (_, doc) = build_documents(&snapshot, &sizes(), 16, ExportFormat::Lua)
            .unwrap()
            .remove(0);
        let groups: Vec<&ObjectGroup> = doc
            .layers
            .iter()
            .filter_map(|l| match l {
                LayerEntry::Objectgroup(g) => Some(g),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].objects.len(), 3);
    }

    #[test]
    fn test_render_formats() {
        let f = fixture();
        let snapshot = ExportSnapshot::capture(&f.registry, &f.maps);
        let (_, doc) = build_documents(&snapshot, &sizes(), 16, ExportFormat::Lua)
            .unwrap()
            .remove(0);

        let lua = render(&doc, ExportFormat::Lua).unwrap();
        assert!(lua.starts_with("return {\n"));
        assert!(lua.contains("orientation = \"orthogonal\""));
        assert!(lua.contains("type = \"tilelayer\""));
        assert!(lua.contains("encoding = \"lua\""));

        let (_, doc) = build_documents(&snapshot, &sizes(), 16, ExportFormat::Json)
            .unwrap()
            .remove(0);
        let json: serde_json::Value =
            serde_json::from_str(&render(&doc, ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["layers"][0]["encoding"], "csv");
        assert_eq!(json["infinite"], true);
        assert_eq!(json["layers"][1]["type"], "objectgroup");
        assert_eq!(json["layers"][1]["objects"][0]["polyline"][1]["x"], 32);
    }

    #[test]
    fn test_export_writes_one_file_per_map() {
        let mut f = fixture();
        let second = f.registry.add(ItemType::Map, Snap::new(16, 16)).id;
        f.registry.get_mut(second).unwrap().name = "Level 2/East".to_string();
        f.maps.insert(second, Map::new());

        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            chunk_size: 16,
            format: ExportFormat::Json,
            directory: dir.path().join("out/maps"),
        };
        let snapshot = ExportSnapshot::capture(&f.registry, &f.maps);
        let written = export_maps(&snapshot, &sizes(), &options).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[0], dir.path().join("out/maps/map0.json"));
        assert_eq!(written[1], dir.path().join("out/maps/Level_2_East.json"));
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_colliding_map_names_get_distinct_files() {
        let mut f = fixture();
        f.registry.get_mut(f.map).unwrap().name = "level 1".to_string();
        for name in ["level_1", "Level_1"] {
            let id = f.registry.add(ItemType::Map, Snap::new(32, 32)).id;
            f.registry.get_mut(id).unwrap().name = name.to_string();
            f.maps.insert(id, Map::new());
        }

        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            format: ExportFormat::Json,
            directory: dir.path().to_path_buf(),
            ..Default::default()
        };
        let snapshot = ExportSnapshot::capture(&f.registry, &f.maps);
        let written = export_maps(&snapshot, &sizes(), &options).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "level_1.json");
        assert!(names.contains(&"level_1_2.json".to_string()));
        assert!(names.contains(&"Level_1_3.json".to_string()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_output_paths_skip_taken_suffixes() {
        let paths = output_paths(Path::new("out"), ["a", "a_2", "a"], ExportFormat::Lua);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/a.lua"),
                PathBuf::from("out/a_2.lua"),
                PathBuf::from("out/a_3.lua"),
            ]
        );
    }

    #[test]
    fn test_missing_image_aborts_before_writing() {
        let f = fixture();
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            directory: dir.path().join("never"),
            ..Default::default()
        };
        let snapshot = ExportSnapshot::capture(&f.registry, &f.maps);
        let err = export_maps(&snapshot, &KnownImageSizes::default(), &options).unwrap_err();
        assert!(matches!(err, ExportError::MissingImageSize { .. }));
        assert!(!options.directory.exists());
    }

    #[test]
    fn test_format_parse_and_sanitize() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(sanitize_file_name("  ../secret "), "_secret");
        assert_eq!(sanitize_file_name(""), "map");
    }
}
