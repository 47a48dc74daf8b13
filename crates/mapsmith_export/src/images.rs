//! Tileset image size lookup

use crate::error::ExportError;
use crate::snapshot::ExportSnapshot;
use mapsmith_core::ItemId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Pixel size `(width, height)` per tileset item
pub type ImageSizes = BTreeMap<ItemId, (u32, u32)>;

/// Source of tileset image dimensions
pub trait ImageSizeResolver {
    fn image_size(&self, image: &str) -> Result<(u32, u32), ExportError>;
}

/// Reads image headers from disk, resolving relative paths against `root`
#[derive(Debug, Clone)]
pub struct FileImageSizes {
    root: PathBuf,
}

impl FileImageSizes {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageSizeResolver for FileImageSizes {
    fn image_size(&self, image: &str) -> Result<(u32, u32), ExportError> {
        let path = self.root.join(image);
        image::image_dimensions(&path).map_err(|source| ExportError::ImageSize { path, source })
    }
}

/// Fixed table of sizes keyed by image path
#[derive(Debug, Clone, Default)]
pub struct KnownImageSizes(pub BTreeMap<String, (u32, u32)>);

impl KnownImageSizes {
    pub fn with(mut self, image: impl Into<String>, w: u32, h: u32) -> Self {
        self.0.insert(image.into(), (w, h));
        self
    }
}

impl ImageSizeResolver for KnownImageSizes {
    fn image_size(&self, image: &str) -> Result<(u32, u32), ExportError> {
        self.0
            .get(image)
            .copied()
            .ok_or_else(|| ExportError::MissingImageSize {
                tileset: String::new(),
                image: image.to_string(),
            })
    }
}

/// Resolve the size of every tileset image in the snapshot.
///
/// Tilesets without an image are left out and export with zero tiles.
pub fn resolve_sizes(
    snapshot: &ExportSnapshot,
    resolver: &dyn ImageSizeResolver,
) -> Result<ImageSizes, ExportError> {
    let mut sizes = ImageSizes::new();
    for tileset in &snapshot.tilesets {
        let Some(image) = tileset.tileset.image.as_deref() else {
            continue;
        };
        let size = resolver.image_size(image).map_err(|e| match e {
            ExportError::MissingImageSize { image, .. } => ExportError::MissingImageSize {
                tileset: tileset.name.clone(),
                image,
            },
            other => other,
        })?;
        sizes.insert(tileset.id, size);
    }
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TilesetSnapshot;
    use mapsmith_core::TilesetItem;
    use uuid::Uuid;

    fn snapshot_with(image: Option<&str>) -> (ExportSnapshot, ItemId) {
        let id = Uuid::new_v4();
        let snapshot = ExportSnapshot {
            tilesets: vec![TilesetSnapshot {
                id,
                name: "ground".to_string(),
                tileset: TilesetItem {
                    image: image.map(str::to_string),
                    ..Default::default()
                },
            }],
            ..Default::default()
        };
        (snapshot, id)
    }

    #[test]
    fn test_resolve_known_sizes() {
        let (snapshot, id) = snapshot_with(Some("ground.png"));
        let resolver = KnownImageSizes::default().with("ground.png", 256, 128);
        let sizes = resolve_sizes(&snapshot, &resolver).unwrap();
        assert_eq!(sizes.get(&id), Some(&(256, 128)));
    }

    #[test]
    fn test_missing_size_names_tileset() {
        let (snapshot, _) = snapshot_with(Some("ground.png"));
        let err = resolve_sizes(&snapshot, &KnownImageSizes::default()).unwrap_err();
        match err {
            ExportError::MissingImageSize { tileset, image } => {
                assert_eq!(tileset, "ground");
                assert_eq!(image, "ground.png");
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tileset_without_image_is_skipped() {
        let (snapshot, _) = snapshot_with(None);
        let sizes = resolve_sizes(&snapshot, &KnownImageSizes::default()).unwrap();
        assert!(sizes.is_empty());
    }

    #[test]
    fn test_file_sizes_read_header() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::new(48, 16);
        img.save(dir.path().join("tiles.png")).unwrap();

        let resolver = FileImageSizes::new(dir.path());
        assert_eq!(resolver.image_size("tiles.png").unwrap(), (48, 16));
        assert!(matches!(
            resolver.image_size("missing.png"),
            Err(ExportError::ImageSize { .. })
        ));
    }
}
