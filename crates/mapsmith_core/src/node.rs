//! Node instances and their point/edge topology

use crate::geometry::{snap, Bounds, Coord, Snap};
use crate::{ItemId, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Label data attached to a single point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelData {
    /// Label type item
    #[serde(rename = "_id")]
    pub label_type: ItemId,
    /// Field id -> value
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl LabelData {
    /// Empty label with every given field set to null
    pub fn new<'a>(label_type: ItemId, field_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            label_type,
            fields: field_ids
                .into_iter()
                .map(|id| (id.to_string(), Value::Null))
                .collect(),
        }
    }
}

/// A vertex of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelData>,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, label: None }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

impl From<Coord> for Point {
    fn from(c: Coord) -> Self {
        Point::new(c.x, c.y)
    }
}

/// Undirected edge between two point positions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge(pub Coord, pub Coord);

impl Edge {
    pub fn touches(&self, c: Coord) -> bool {
        self.0 == c || self.1 == c
    }
}

/// Endpoint pairs match in either order
pub fn same_edge(a: &Edge, b: &Edge) -> bool {
    (a.0 == b.0 && a.1 == b.1) || (a.0 == b.1 && a.1 == b.0)
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        same_edge(self, other)
    }
}

impl Eq for Edge {}

/// Points plus the persisted edge subset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeGeometry {
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl NodeGeometry {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            edges: Vec::new(),
        }
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.points.iter().any(|p| p.coord() == c)
    }

    pub fn position_of(&self, c: Coord) -> Option<usize> {
        self.points.iter().position(|p| p.coord() == c)
    }

    pub fn has_edge(&self, edge: &Edge) -> bool {
        self.edges.iter().any(|e| same_edge(e, edge))
    }

    /// Minimum corner of the point set
    pub fn origin(&self) -> Option<Coord> {
        Bounds::enclosing(self.points.iter().map(Point::coord)).map(|b| b.min)
    }

    /// Every distinct unordered pair of distinct positions
    pub fn candidate_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = Vec::new();
        for a in &self.points {
            for b in &self.points {
                let edge = Edge(a.coord(), b.coord());
                if a.coord() != b.coord() && !edges.iter().any(|e| same_edge(e, &edge)) {
                    edges.push(edge);
                }
            }
        }
        edges
    }

    /// Segments implied by point order
    pub fn path_segments(&self) -> impl Iterator<Item = Edge> + '_ {
        self.points
            .windows(2)
            .map(|w| Edge(w[0].coord(), w[1].coord()))
    }

    /// Flip membership of the edge `a`-`b`.
    ///
    /// Returns `Some(true)` if the edge is now present, `Some(false)` if it
    /// was removed, and `None` if either endpoint is not a point of this node
    /// or both endpoints coincide.
    pub fn toggle_edge(&mut self, a: Coord, b: Coord) -> Option<bool> {
        if a == b || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let edge = Edge(a, b);
        match self.edges.iter().position(|e| same_edge(e, &edge)) {
            Some(idx) => {
                self.edges.remove(idx);
                Some(false)
            }
            None => {
                self.edges.push(edge);
                Some(true)
            }
        }
    }

    /// Remove a point and every edge touching it
    pub fn remove_point(&mut self, idx: usize) -> Option<Point> {
        if idx >= self.points.len() {
            return None;
        }
        let point = self.points.remove(idx);
        let c = point.coord();
        // another point at the same position keeps its edges
        if !self.contains(c) {
            self.edges.retain(|e| !e.touches(c));
        }
        Some(point)
    }

    /// Move a point, carrying its edges along.
    ///
    /// Refused when another point already occupies `to`.
    pub fn move_point(&mut self, idx: usize, to: Coord) -> bool {
        let Some(from) = self.points.get(idx).map(Point::coord) else {
            return false;
        };
        if from == to || self.contains(to) {
            return false;
        }
        for edge in &mut self.edges {
            if edge.0 == from {
                edge.0 = to;
            }
            if edge.1 == from {
                edge.1 = to;
            }
        }
        let point = &mut self.points[idx];
        point.x = to.x;
        point.y = to.y;
        true
    }

    /// Insert a vertex at the snapped midpoint of path segment `segment`
    /// (the segment ending at point `segment`).
    ///
    /// Returns the index of the new point, or `None` when the segment does
    /// not exist or the midpoint cell is already occupied.
    pub fn insert_midpoint(&mut self, segment: usize, step: Snap, offset: Coord) -> Option<usize> {
        if segment == 0 || segment >= self.points.len() {
            return None;
        }
        let a = self.points[segment - 1].coord();
        let b = self.points[segment].coord();
        let mid = Coord::new(
            ((a.x as i64 + b.x as i64).div_euclid(2)) as i32,
            ((a.y as i64 + b.y as i64).div_euclid(2)) as i32,
        );
        let mid = snap(mid, step, offset);
        if self.contains(mid) {
            return None;
        }
        self.points.insert(segment, Point::from(mid));
        Some(segment)
    }

    /// Drop every label of the given label type
    pub fn strip_label(&mut self, label_type: ItemId) -> bool {
        let mut changed = false;
        for point in &mut self.points {
            if point.label.as_ref().map(|l| l.label_type) == Some(label_type) {
                point.label = None;
                changed = true;
            }
        }
        changed
    }
}

/// A committed node on a map layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Unique instance key
    pub key: Uuid,
    /// Node type item
    pub id: ItemId,
    pub node: NodeGeometry,
}

impl NodeInstance {
    pub fn new(node_type: ItemId, points: Vec<Point>) -> Self {
        Self {
            key: Uuid::new_v4(),
            id: node_type,
            node: NodeGeometry::from_points(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn geometry(points: &[(i32, i32)]) -> NodeGeometry {
        NodeGeometry::from_points(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_same_edge_is_symmetric() {
        let ab = Edge(c(0, 0), c(32, 0));
        let ba = Edge(c(32, 0), c(0, 0));
        assert!(same_edge(&ab, &ba));
        assert_eq!(ab, ba);
        assert!(!same_edge(&ab, &Edge(c(0, 0), c(0, 32))));
    }

    #[test]
    fn test_candidate_edges_triangle() {
        let g = geometry(&[(0, 0), (32, 0), (64, 0)]);
        let edges = g.candidate_edges();
        assert_eq!(edges.len(), 3);
        assert!(g.edges.is_empty());
    }

    #[test]
    fn test_candidate_edges_skip_duplicate_positions() {
        let g = geometry(&[(0, 0), (0, 0), (32, 0)]);
        assert_eq!(g.candidate_edges().len(), 1);
    }

    #[test]
    fn test_path_segments() {
        let g = geometry(&[(0, 0), (32, 0), (64, 0)]);
        let segments: Vec<Edge> = g.path_segments().collect();
        assert_eq!(segments, vec![Edge(c(0, 0), c(32, 0)), Edge(c(32, 0), c(64, 0))]);
    }

    #[test]
    fn test_toggle_edge() {
        let mut g = geometry(&[(0, 0), (32, 0)]);
        assert_eq!(g.toggle_edge(c(0, 0), c(32, 0)), Some(true));
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.toggle_edge(c(32, 0), c(0, 0)), Some(false));
        assert!(g.edges.is_empty());
        assert_eq!(g.toggle_edge(c(0, 0), c(99, 99)), None);
        assert_eq!(g.toggle_edge(c(0, 0), c(0, 0)), None);
    }

    #[test]
    fn test_remove_point_drops_edges() {
        let mut g = geometry(&[(0, 0), (32, 0), (64, 0)]);
        g.toggle_edge(c(0, 0), c(32, 0));
        g.toggle_edge(c(32, 0), c(64, 0));
        g.toggle_edge(c(0, 0), c(64, 0));

        let removed = g.remove_point(1).unwrap();
        assert_eq!(removed.coord(), c(32, 0));
        assert_eq!(g.points.len(), 2);
        assert_eq!(g.edges, vec![Edge(c(0, 0), c(64, 0))]);
        assert!(g.edges.iter().all(|e| !e.touches(c(32, 0))));
        assert!(g.remove_point(7).is_none());
    }

    #[test]
    fn test_move_point_carries_edges() {
        let mut g = geometry(&[(0, 0), (32, 0)]);
        g.toggle_edge(c(0, 0), c(32, 0));
        assert!(g.move_point(1, c(32, 32)));
        assert_eq!(g.points[1].coord(), c(32, 32));
        assert_eq!(g.edges, vec![Edge(c(0, 0), c(32, 32))]);
        // occupied target
        assert!(!g.move_point(1, c(0, 0)));
    }

    #[test]
    fn test_insert_midpoint() {
        let mut g = geometry(&[(0, 0), (64, 0)]);
        let step = Snap::new(32, 32);
        assert_eq!(g.insert_midpoint(1, step, Coord::ZERO), Some(1));
        assert_eq!(g.points[1].coord(), c(32, 0));
        // 0..32 midpoint snaps back onto (0, 0), already occupied
        assert_eq!(g.insert_midpoint(1, step, Coord::ZERO), None);
        assert_eq!(g.insert_midpoint(0, step, Coord::ZERO), None);
    }

    #[test]
    fn test_strip_label() {
        let label = Uuid::new_v4();
        let mut g = geometry(&[(0, 0), (32, 0)]);
        g.points[0].label = Some(LabelData::new(label, ["hp"]));
        assert!(g.strip_label(label));
        assert!(g.points[0].label.is_none());
        assert!(!g.strip_label(label));
    }

    #[test]
    fn test_label_data_serializes_flat() {
        let label = Uuid::new_v4();
        let mut data = LabelData::new(label, ["a1"]);
        data.fields.insert("a1".to_string(), Value::Int(4));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["_id"], label.to_string());
        assert_eq!(json["a1"], 4);
        let parsed: LabelData = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_origin() {
        let g = geometry(&[(64, 10), (32, 40), (96, 20)]);
        assert_eq!(g.origin(), Some(c(32, 10)));
        assert_eq!(NodeGeometry::default().origin(), None);
    }

    fn coord_strategy() -> impl Strategy<Value = Coord> {
        (-8i32..8, -8i32..8).prop_map(|(x, y)| Coord::new(x * 32, y * 32))
    }

    proptest! {
        #[test]
        fn prop_same_edge_symmetric(a in coord_strategy(), b in coord_strategy(),
                                    x in coord_strategy(), y in coord_strategy()) {
            prop_assert_eq!(
                same_edge(&Edge(a, b), &Edge(x, y)),
                same_edge(&Edge(b, a), &Edge(x, y))
            );
        }

        #[test]
        fn prop_toggle_twice_restores(points in proptest::collection::vec(coord_strategy(), 2..8),
                                      i in 0usize..8, j in 0usize..8) {
            let mut g = NodeGeometry::from_points(points.iter().copied().map(Point::from).collect());
            let a = points[i % points.len()];
            let b = points[j % points.len()];
            for edge in g.candidate_edges().into_iter().step_by(2) {
                g.toggle_edge(edge.0, edge.1);
            }
            let before = g.edges.clone();
            g.toggle_edge(a, b);
            g.toggle_edge(a, b);
            prop_assert_eq!(g.edges, before);
        }

        #[test]
        fn prop_remove_point_leaves_no_dangling_edges(
            points in proptest::collection::vec(coord_strategy(), 1..8), idx in 0usize..8,
        ) {
            let mut g = NodeGeometry::from_points(points.iter().copied().map(Point::from).collect());
            for edge in g.candidate_edges() {
                g.toggle_edge(edge.0, edge.1);
            }
            let idx = idx % points.len();
            g.remove_point(idx);
            for edge in &g.edges {
                prop_assert!(g.contains(edge.0) && g.contains(edge.1));
            }
        }
    }
}
