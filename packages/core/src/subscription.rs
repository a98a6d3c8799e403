//! Target documents and listener subscriptions of a renderer

use crate::document::DocumentHandle;
use crate::listener::{deliver, ListenerEntry, Listener, SinkContext, SubscriptionId};
use crate::renderer::Renderer;
use std::rc::Rc;
use tracing::debug;

/// A document the renderer writes into
#[derive(Debug, Clone)]
pub struct DocumentRef {
    /// `None` for the default ref of a renderer without a document (server)
    pub target: Option<DocumentHandle>,
    pub ref_count: u32,
    pub ref_id: u32,
}

impl DocumentRef {
    pub(crate) fn default_ref(target: Option<DocumentHandle>) -> Self {
        Self {
            target,
            ref_count: 1,
            ref_id: 0,
        }
    }

    pub fn targets(&self, document: &DocumentHandle) -> bool {
        self.target
            .as_ref()
            .map(|target| Rc::ptr_eq(target, document))
            .unwrap_or(false)
    }
}

/// Returned by `Renderer::subscribe_document`; hand it back to
/// `Renderer::unsubscribe_document` to detach the document again
#[derive(Debug, Clone)]
pub struct DocumentSubscription {
    target: DocumentHandle,
    ref_id: u32,
}

impl DocumentSubscription {
    pub fn target(&self) -> &DocumentHandle {
        &self.target
    }

    pub fn ref_id(&self) -> u32 {
        self.ref_id
    }
}

impl Renderer {
    /// Register a listener for every future change
    pub fn subscribe(&mut self, listener: impl Listener + 'static) -> SubscriptionId {
        self.next_subscription_id += 1;
        let id = SubscriptionId(self.next_subscription_id);
        debug!(listener = listener.name(), "Subscribing listener");

        self.listeners.push(ListenerEntry {
            id,
            listener: Box::new(listener),
        });
        id
    }

    /// Returns `false` if the subscription was already removed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|entry| entry.id != id);
        self.listeners.len() != before
    }

    pub fn has_listener(&self, name: &str) -> bool {
        self.listeners
            .iter()
            .any(|entry| entry.listener.name() == name)
    }

    pub fn document_refs(&self) -> &[DocumentRef] {
        &self.document_refs
    }

    pub fn document_ref(&self, document: &DocumentHandle) -> Option<&DocumentRef> {
        self.document_refs.iter().find(|r| r.targets(document))
    }

    /// Start writing into `document`.
    ///
    /// A document seen for the first time gets a fresh ref and receives every
    /// change cached so far; a known one only has its reference count bumped.
    pub fn subscribe_document(&mut self, document: &DocumentHandle) -> DocumentSubscription {
        if let Some(existing) = self
            .document_refs
            .iter_mut()
            .find(|r| r.targets(document))
        {
            existing.ref_count += 1;
            debug!(ref_id = existing.ref_id, ref_count = existing.ref_count, "Document already subscribed");
            return DocumentSubscription {
                target: Rc::clone(document),
                ref_id: existing.ref_id,
            };
        }

        self.unique_document_identifier += 1;
        let ref_id = self.unique_document_identifier;
        self.document_refs.push(DocumentRef {
            target: Some(Rc::clone(document)),
            ref_count: 1,
            ref_id,
        });
        debug!(ref_id, "Subscribed new document");

        self.replay_document(ref_id);

        DocumentSubscription {
            target: Rc::clone(document),
            ref_id,
        }
    }

    /// Release one subscription of a document. The last release removes the
    /// ref and forgets its nodes; the nodes stay in the document.
    pub fn unsubscribe_document(&mut self, subscription: &DocumentSubscription) {
        let Some(index) = self
            .document_refs
            .iter()
            .position(|r| r.targets(&subscription.target))
        else {
            return;
        };

        let document_ref = &mut self.document_refs[index];
        if document_ref.ref_count > 1 {
            document_ref.ref_count -= 1;
            return;
        }

        let ref_id = document_ref.ref_id;
        self.document_refs.remove(index);
        self.nodes.retain(|key, _| key.ref_id != ref_id);
        self.score_index.retain(|key, _| key.ref_id != ref_id);
        debug!(ref_id, "Unsubscribed document");
    }

    /// Re-deliver every cached change, in render order, to a single document
    pub fn replay_document(&mut self, ref_id: u32) {
        let Some(document_ref) = self
            .document_refs
            .iter()
            .find(|r| r.ref_id == ref_id)
            .cloned()
        else {
            return;
        };

        let changes: Vec<_> = self.cache.changes().cloned().collect();
        debug!(ref_id, changes = changes.len(), "Replaying cache");

        let documents = [document_ref];
        let Renderer {
            listeners,
            nodes,
            score_index,
            settings,
            ..
        } = self;
        let mut ctx = SinkContext {
            documents: &documents,
            nodes,
            score_index,
            settings,
            replay: true,
        };
        for change in &changes {
            deliver(listeners, change, &mut ctx);
        }
    }
}
