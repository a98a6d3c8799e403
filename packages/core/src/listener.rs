//! Change listeners and the bookkeeping sinks share with the renderer

use crate::config::RendererSettings;
use crate::document::NodeId;
use crate::subscription::DocumentRef;
use fela_utils::{Change, StyleType};
use std::collections::HashMap;

/// Identifies the stylesheet node holding rules of one context in one
/// document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub kind: StyleType,
    pub media: String,
    pub support: String,
    pub ref_id: u32,
}

impl NodeKey {
    pub fn new(kind: StyleType, media: impl Into<String>, support: impl Into<String>, ref_id: u32) -> Self {
        Self {
            kind,
            media: media.into(),
            support: support.into(),
            ref_id,
        }
    }

    /// Node a change is written into inside the document `ref_id`
    pub fn for_change(change: &Change, ref_id: u32) -> Self {
        Self::new(change.style_type(), change.media(), change.support(), ref_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeEntry {
    pub score: u32,
    pub node: NodeId,
}

/// Node bookkeeping of every subscribed document
pub type NodeMap = HashMap<NodeKey, NodeEntry>;

/// Last known insertion index of order-insensitive rules per rule node
pub type ScoreIndex = HashMap<NodeKey, usize>;

/// What a listener may see and touch while handling a change
pub struct SinkContext<'a> {
    /// Documents the change is delivered to. A replay targets only the
    /// newly subscribed document.
    pub documents: &'a [DocumentRef],
    pub nodes: &'a mut NodeMap,
    pub score_index: &'a mut ScoreIndex,
    pub settings: &'a RendererSettings,
    /// Set when already cached changes are re-delivered
    pub replay: bool,
}

impl SinkContext<'_> {
    /// Forget every node of a document
    pub fn purge_document(&mut self, ref_id: u32) {
        self.nodes.retain(|key, _| key.ref_id != ref_id);
        self.score_index.retain(|key, _| key.ref_id != ref_id);
    }
}

/// Receives every change the renderer emits after subscribing
pub trait Listener {
    fn on_change(&mut self, change: &Change, ctx: &mut SinkContext<'_>);

    fn name(&self) -> &str {
        "listener"
    }
}

impl<F> Listener for F
where
    F: FnMut(&Change, &mut SinkContext<'_>),
{
    fn on_change(&mut self, change: &Change, ctx: &mut SinkContext<'_>) {
        self(change, ctx)
    }
}

/// Handle returned by `Renderer::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) struct ListenerEntry {
    pub(crate) id: SubscriptionId,
    pub(crate) listener: Box<dyn Listener>,
}

/// Fan a change out to listeners in subscription order
pub(crate) fn deliver(listeners: &mut [ListenerEntry], change: &Change, ctx: &mut SinkContext<'_>) {
    for entry in listeners.iter_mut() {
        entry.listener.on_change(change, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_key_for_change() {
        let change = Change::Rule {
            class_name: "a".to_string(),
            selector: ".a".to_string(),
            declaration: "color:red".to_string(),
            pseudo: String::new(),
            media: "screen".to_string(),
            support: String::new(),
        };
        assert_eq!(
            NodeKey::for_change(&change, 2),
            NodeKey::new(StyleType::Rule, "screen", "", 2)
        );

        let font = Change::Font {
            font_face: "@font-face{}".to_string(),
            font_family: "\"A\"".to_string(),
        };
        assert_eq!(NodeKey::for_change(&font, 0).kind, StyleType::Font);
    }
}
