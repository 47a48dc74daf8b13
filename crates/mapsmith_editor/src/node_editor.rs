//! In-progress node authoring
//!
//! Points accumulate in a pending buffer until the node is finished. The
//! buffer belongs to the editor session, not to a map or layer, and is not
//! part of the persisted document.

use mapsmith_core::{ConnectType, Coord, Edge, NodeGeometry, Point};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeEditor {
    pending: NodeGeometry,
    /// Committed graph node that new points are appended to
    selected_node: Option<Uuid>,
}

impl NodeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[Point] {
        &self.pending.points
    }

    pub fn selected_node(&self) -> Option<Uuid> {
        self.selected_node
    }

    /// Add a snapped point for a node of `connect_type`.
    ///
    /// Returns the points to commit right away: `none` nodes are one point
    /// each and never touch the buffer. For paths and graphs a point that is
    /// already pending moves to the end of the buffer.
    pub fn add_point(&mut self, at: Coord, connect_type: ConnectType) -> Option<Vec<Point>> {
        if connect_type == ConnectType::None {
            return Some(vec![Point::from(at)]);
        }
        if let Some(idx) = self.pending.position_of(at) {
            let point = self.pending.points.remove(idx);
            self.pending.points.push(point);
        } else {
            self.pending.points.push(Point::from(at));
        }
        None
    }

    /// Take the pending buffer for commit; `None` when it is empty
    pub fn finish(&mut self) -> Option<Vec<Point>> {
        if self.pending.points.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending).points)
    }

    /// Undo an uncommitted point.
    ///
    /// Paths drop the last point; graphs drop the point at `idx` (the last
    /// one when not given).
    pub fn undo_point(&mut self, connect_type: ConnectType, idx: Option<usize>) -> Option<Point> {
        match connect_type {
            ConnectType::None => None,
            ConnectType::Path => self.pending.points.pop(),
            ConnectType::Graph => {
                let idx = idx.or_else(|| self.pending.points.len().checked_sub(1))?;
                self.pending.remove_point(idx)
            }
        }
    }

    /// Edges to draw for the pending buffer
    pub fn preview_edges(&self, connect_type: ConnectType) -> Vec<Edge> {
        match connect_type {
            ConnectType::None => Vec::new(),
            ConnectType::Path => self.pending.path_segments().collect(),
            ConnectType::Graph => self.pending.candidate_edges(),
        }
    }

    /// Toggle focus on a committed node; `force` always selects.
    ///
    /// Returns whether `key` is selected afterwards.
    pub fn select_node(&mut self, key: Uuid, force: bool) -> bool {
        if !force && self.selected_node == Some(key) {
            self.selected_node = None;
            return false;
        }
        self.selected_node = Some(key);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected_node = None;
    }

    /// Drop the pending buffer and the selected node
    pub fn reset(&mut self) {
        self.pending = NodeGeometry::default();
        self.selected_node = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_none_commits_immediately() {
        let mut editor = NodeEditor::new();
        let points = editor.add_point(c(32, 32), ConnectType::None).unwrap();
        assert_eq!(points, vec![Point::new(32, 32)]);
        assert!(editor.pending().is_empty());
        assert_eq!(editor.finish(), None);
    }

    #[test]
    fn test_path_accumulates_in_order() {
        let mut editor = NodeEditor::new();
        for x in [0, 32, 64] {
            assert_eq!(editor.add_point(c(x, 0), ConnectType::Path), None);
        }
        assert_eq!(editor.preview_edges(ConnectType::Path).len(), 2);
        assert_eq!(editor.preview_edges(ConnectType::Graph).len(), 3);

        let points = editor.finish().unwrap();
        assert_eq!(points.iter().map(Point::coord).collect::<Vec<_>>(), vec![
            c(0, 0),
            c(32, 0),
            c(64, 0)
        ]);
        assert!(editor.pending().is_empty());
    }

    #[test]
    fn test_repeated_point_moves_to_end() {
        let mut editor = NodeEditor::new();
        editor.add_point(c(0, 0), ConnectType::Graph);
        editor.add_point(c(32, 0), ConnectType::Graph);
        editor.add_point(c(0, 0), ConnectType::Graph);
        assert_eq!(editor.pending(), &[Point::new(32, 0), Point::new(0, 0)]);
    }

    #[test]
    fn test_undo_point_by_connect_type() {
        let mut editor = NodeEditor::new();
        for x in [0, 32, 64] {
            editor.add_point(c(x, 0), ConnectType::Path);
        }
        assert_eq!(editor.undo_point(ConnectType::Path, Some(0)), Some(Point::new(64, 0)));
        assert_eq!(editor.undo_point(ConnectType::Graph, Some(0)), Some(Point::new(0, 0)));
        assert_eq!(editor.undo_point(ConnectType::Graph, Some(7)), None);
        assert_eq!(editor.undo_point(ConnectType::None, None), None);
        assert_eq!(editor.undo_point(ConnectType::Graph, None), Some(Point::new(32, 0)));
        assert_eq!(editor.undo_point(ConnectType::Graph, None), None);
    }

    #[test]
    fn test_select_node_toggles() {
        let mut editor = NodeEditor::new();
        let key = Uuid::new_v4();
        assert!(editor.select_node(key, false));
        assert!(!editor.select_node(key, false));
        assert_eq!(editor.selected_node(), None);
        editor.select_node(key, false);
        assert!(editor.select_node(key, true));
        editor.add_point(c(0, 0), ConnectType::Path);
        editor.reset();
        assert_eq!(editor.selected_node(), None);
        assert!(editor.pending().is_empty());
    }
}
