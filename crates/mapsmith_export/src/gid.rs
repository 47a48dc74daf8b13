//! Global tile id allocation

use crate::images::ImageSizes;
use crate::snapshot::TilesetSnapshot;
use mapsmith_core::{ItemId, TilePlacement};

/// The gid range claimed by one tileset
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetRange {
    pub id: ItemId,
    pub name: String,
    pub firstgid: u32,
    pub tilecount: u32,
    pub columns: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    pub image: String,
    pub imagewidth: u32,
    pub imageheight: u32,
}

/// Gid ranges of every tileset, in allocation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GidTable {
    ranges: Vec<TilesetRange>,
}

impl GidTable {
    /// Assign sequential ranges starting at gid 1
    pub fn allocate(tilesets: &[TilesetSnapshot], sizes: &ImageSizes) -> Self {
        let mut next = 1u32;
        let mut ranges = Vec::with_capacity(tilesets.len());
        for tileset in tilesets {
            let (imagewidth, imageheight) = sizes.get(&tileset.id).copied().unwrap_or((0, 0));
            let tilecount = tileset.tileset.tile_count(imagewidth, imageheight);
            ranges.push(TilesetRange {
                id: tileset.id,
                name: tileset.name.clone(),
                firstgid: next,
                tilecount,
                columns: tileset.tileset.columns(imagewidth),
                tilewidth: tileset.tileset.size.w,
                tileheight: tileset.tileset.size.h,
                image: tileset.tileset.image.clone().unwrap_or_default(),
                imagewidth,
                imageheight,
            });
            next = next.saturating_add(tilecount);
        }
        Self { ranges }
    }

    pub fn ranges(&self) -> &[TilesetRange] {
        &self.ranges
    }

    pub fn get(&self, tileset: ItemId) -> Option<&TilesetRange> {
        self.ranges.iter().find(|r| r.id == tileset)
    }

    /// Global id for a placement, `None` if its tileset is unknown or has no frames
    pub fn gid_of(&self, tile: &TilePlacement) -> Option<u32> {
        let range = self.get(tile.id)?;
        if range.tilewidth == 0 || range.tileheight == 0 {
            return None;
        }
        let row = tile.fragment.y / range.tileheight;
        let col = tile.fragment.x / range.tilewidth;
        let index = row.checked_mul(range.columns)?.checked_add(col)?;
        range.firstgid.checked_add(index)
    }
}
