//! Central document state with change notification

use crate::document::Document;

/// Handle returned by [`DocumentStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Document)>;

/// Owns the live document; listeners hear about every change
#[derive(Default)]
pub struct DocumentStore {
    document: Document,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("document", &self.document)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DocumentStore {
    /// Take ownership of `document`, rebuilding its content index
    pub fn new(mut document: Document) -> Self {
        document.canvas.rebuild_index();
        Self {
            document,
            ..Default::default()
        }
    }

    pub fn get(&self) -> &Document {
        &self.document
    }

    /// Replace the document and notify listeners
    pub fn set(&mut self, mut document: Document) {
        document.canvas.rebuild_index();
        self.document = document;
        self.notify();
    }

    /// Run `f` on the document; listeners are notified only when it reports a change
    pub fn update(&mut self, f: impl FnOnce(&mut Document) -> bool) -> bool {
        let changed = f(&mut self.document);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Document) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.document);
        }
    }
}
