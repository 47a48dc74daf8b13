//! Whole-document undo/redo history
//!
//! Each entry is a full `Document` snapshot. Map layers are shared through
//! `Arc`, so a snapshot only costs the layers a later edit touches.

use crate::document::Document;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct History {
    /// Documents before each recorded edit, oldest first
    undo_stack: VecDeque<Document>,
    /// Documents replaced by undo, most recent last
    redo_stack: Vec<Document>,
    size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_SIZE)
    }
}

impl History {
    pub fn new(size: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(size.min(64)),
            redo_stack: Vec::new(),
            size,
        }
    }

    /// Record the document as it was before an edit and clear redo.
    ///
    /// When full, the oldest entry is dropped.
    pub fn record(&mut self, before: Document) {
        self.redo_stack.clear();
        if self.size == 0 {
            return;
        }
        while self.undo_stack.len() >= self.size {
            self.undo_stack.pop_front();
            debug!("History full, dropped oldest entry");
        }
        self.undo_stack.push_back(before);
    }

    /// Restore the previous document into `current`
    pub fn undo(&mut self, current: &mut Document) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(std::mem::replace(current, previous));
        current.canvas.rebuild_index();
        debug!("Undo ({} left)", self.undo_stack.len());
        true
    }

    /// Reapply the most recently undone document into `current`
    pub fn redo(&mut self, current: &mut Document) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push_back(std::mem::replace(current, next));
        current.canvas.rebuild_index();
        debug!("Redo ({} left)", self.redo_stack.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Drop both stacks
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapsmith_core::{ItemType, Snap};

    fn edit(history: &mut History, doc: &mut Document) {
        history.record(doc.clone());
        doc.add_item(ItemType::Layer, Snap::default());
    }

    #[test]
    fn test_undo_redo_mirror() {
        let mut history = History::new(10);
        let mut doc = Document::new("demo");
        let start = doc.clone();
        edit(&mut history, &mut doc);
        let after = doc.clone();

        assert!(history.undo(&mut doc));
        assert_eq!(doc, start);
        assert!(!history.undo(&mut doc));
        assert!(history.redo(&mut doc));
        assert_eq!(doc, after);
        assert!(!history.redo(&mut doc));
    }

    #[test]
    fn test_bounded_with_fifo_eviction() {
        let mut history = History::new(3);
        let mut doc = Document::new("demo");
        let mut states = vec![doc.clone()];
        for _ in 0..5 {
            edit(&mut history, &mut doc);
            states.push(doc.clone());
        }
        assert_eq!(history.undo_len(), 3);
        while history.undo(&mut doc) {}
        // the two oldest states were evicted
        assert_eq!(doc, states[2]);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        let mut doc = Document::new("demo");
        edit(&mut history, &mut doc);
        history.undo(&mut doc);
        assert!(history.can_redo());
        edit(&mut history, &mut doc);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_zero_size_records_nothing() {
        let mut history = History::new(0);
        let mut doc = Document::new("demo");
        edit(&mut history, &mut doc);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_reset() {
        let mut history = History::default();
        let mut doc = Document::new("demo");
        edit(&mut history, &mut doc);
        history.reset();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.size(), 10);
    }
}
