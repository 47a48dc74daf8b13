//! Spatial chunking of tile layers

use crate::gid::GidTable;
use mapsmith_core::{Snap, TilePlacement};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: u32 = 16;

/// A `size x size` block of gids, row-major; 0 means empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Origin in cell units
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
}

impl Chunk {
    pub fn filled(&self) -> usize {
        self.data.iter().filter(|&&gid| gid != 0).count()
    }
}

/// Bucket placements into chunks.
///
/// Cells are `snap` sized; an axis without a positive step counts single
/// pixels. Chunk and local indices use floor division so negative positions
/// land in negative chunks. Chunks are returned in row-major chunk order and
/// chunks left entirely empty are dropped. When two placements fall in one
/// cell the later one is kept.
pub fn build_chunks(
    tiles: &[TilePlacement],
    snap: Snap,
    chunk_size: u32,
    gids: &GidTable,
) -> Vec<Chunk> {
    let size = chunk_size.max(1) as i64;
    let step_x = if snap.x > 0 { snap.x as i64 } else { 1 };
    let step_y = if snap.y > 0 { snap.y as i64 } else { 1 };
    let cells = (size * size) as usize;

    let mut chunks: BTreeMap<(i64, i64), Vec<u32>> = BTreeMap::new();
    for tile in tiles {
        let Some(gid) = gids.gid_of(tile) else {
            warn!("Skipping tile {} with unknown tileset {}", tile.key, tile.id);
            continue;
        };
        let cell_x = (tile.x as i64).div_euclid(step_x);
        let cell_y = (tile.y as i64).div_euclid(step_y);
        let chunk = (cell_x.div_euclid(size), cell_y.div_euclid(size));
        let local = cell_y.rem_euclid(size) * size + cell_x.rem_euclid(size);

        let data = chunks.entry((chunk.1, chunk.0)).or_insert_with(|| vec![0; cells]);
        if let Some(slot) = usize::try_from(local).ok().and_then(|i| data.get_mut(i)) {
            if *slot != 0 {
                warn!(
                    "Tile {} shares cell ({}, {}) with another tile",
                    tile.key, cell_x, cell_y
                );
            }
            *slot = gid;
        }
    }

    chunks
        .into_iter()
        .filter(|(_, data)| data.iter().any(|&gid| gid != 0))
        .map(|((cy, cx), data)| Chunk {
            x: cx * size,
            y: cy * size,
            width: size as u32,
            height: size as u32,
            data,
        })
        .collect()
}

/// Cell extent `(width, height)` covered by a set of chunks
pub fn extent(chunks: &[Chunk]) -> (u32, u32) {
    let Some(first) = chunks.first() else {
        return (0, 0);
    };
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x + first.width as i64, first.y + first.height as i64);
    for chunk in chunks {
        min_x = min_x.min(chunk.x);
        min_y = min_y.min(chunk.y);
        max_x = max_x.max(chunk.x + chunk.width as i64);
        max_y = max_y.max(chunk.y + chunk.height as i64);
    }
    (
        (max_x - min_x).clamp(0, u32::MAX as i64) as u32,
        (max_y - min_y).clamp(0, u32::MAX as i64) as u32,
    )
}
