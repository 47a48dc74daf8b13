//! Grid geometry and snapping
//!
//! All positions on a map are integer pixel coordinates. A snap step of zero
//! (or less) means "no snapping" on that axis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pixel position on a map
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ZERO: Coord = Coord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert a raw pointer position to a pixel coordinate.
    ///
    /// Fractional positions are floored so that sub-pixel input never lands on
    /// the wrong side of a grid line.
    pub fn from_raw(x: f64, y: f64) -> Result<Self, GeometryError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFinite { x, y });
        }
        let (fx, fy) = (x.floor(), y.floor());
        let range = i32::MIN as f64..=i32::MAX as f64;
        if !range.contains(&fx) || !range.contains(&fy) {
            return Err(GeometryError::OutOfRange { x, y });
        }
        Ok(Self::new(fx as i32, fy as i32))
    }

    /// Component-wise minimum
    pub fn min(self, other: Coord) -> Coord {
        Coord::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum
    pub fn max(self, other: Coord) -> Coord {
        Coord::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Translate by `(dx, dy)`, saturating at the coordinate limits
    pub fn offset(self, dx: i64, dy: i64) -> Coord {
        Coord::new(saturate(self.x as i64 + dx), saturate(self.y as i64 + dy))
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}

/// Errors raised when a raw input coordinate cannot be used
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
    #[error("coordinate ({x}, {y}) is outside the map coordinate range")]
    OutOfRange { x: f64, y: f64 },
}

/// Grid step per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Snap {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Snap {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Per-axis layer override with map fallback.
    ///
    /// A zero or negative layer step counts as "not set".
    pub fn resolve(layer: Snap, map: Snap) -> Snap {
        Snap {
            x: if layer.x > 0 { layer.x } else { map.x },
            y: if layer.y > 0 { layer.y } else { map.y },
        }
    }

    /// Whether both axes have a usable step
    pub fn is_grid(&self) -> bool {
        self.x > 0 && self.y > 0
    }
}

/// Snap a single axis value down to the cell origin containing it.
///
/// Uses floor semantics, so `-1` with a step of `32` lands on `-32`.
pub fn snap_axis(value: i32, step: i32, offset: i32) -> i32 {
    if step <= 0 {
        return value;
    }
    let value = value as i64;
    let step = step as i64;
    let mut snapped = value - (value - offset as i64).rem_euclid(step);
    if snapped < i32::MIN as i64 {
        snapped += step;
    }
    snapped as i32
}

/// Snap a position to the grid origin of the cell containing it
pub fn snap(point: Coord, step: Snap, offset: Coord) -> Coord {
    Coord::new(
        snap_axis(point.x, step.x, offset.x),
        snap_axis(point.y, step.y, offset.y),
    )
}

/// Inclusive axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Coord,
    pub max: Coord,
}

impl Bounds {
    /// Build from two arbitrary corners
    pub fn from_corners(a: Coord, b: Coord) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, p: Coord) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    /// Smallest bounds containing every point, `None` for an empty set
    pub fn enclosing(points: impl IntoIterator<Item = Coord>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Bounds { min: first, max: first }, |b, p| Bounds {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }
}

/// Anchors for a rectangular fill dragged from `start` to `end`.
///
/// Stamps of `stamp_w` x `stamp_h` pixels are laid edge to edge from the
/// top-left corner of the drag so that both the start and end cells are
/// covered. Every anchor is snapped to the grid. At least one anchor is
/// always produced.
pub fn fill_anchors(
    start: Coord,
    end: Coord,
    stamp_w: i32,
    stamp_h: i32,
    step: Snap,
    offset: Coord,
) -> Vec<Coord> {
    let area = Bounds::from_corners(start, end);
    let span_x = area.max.x as i64 - area.min.x as i64;
    let span_y = area.max.y as i64 - area.min.y as i64;
    let count_x = if stamp_w > 0 { span_x / stamp_w as i64 + 1 } else { 1 };
    let count_y = if stamp_h > 0 { span_y / stamp_h as i64 + 1 } else { 1 };

    let mut anchors: Vec<Coord> = Vec::with_capacity((count_x * count_y).min(4096) as usize);
    for j in 0..count_y {
        for i in 0..count_x {
            let at = area.min.offset(i * stamp_w.max(0) as i64, j * stamp_h.max(0) as i64);
            let anchor = snap(at, step, offset);
            if !anchors.contains(&anchor) {
                anchors.push(anchor);
            }
        }
    }
    anchors
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
