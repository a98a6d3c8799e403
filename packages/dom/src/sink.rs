//! The listener that writes changes into documents

use crate::connection::{get_node, insert_rule};
use fela::{DocumentHandle, DocumentSubscription, Listener, NodeKey, Renderer, SinkContext, StyleNode};
use fela_utils::{generate_css_rule, Change};
use tracing::{debug, instrument, trace};

pub const SINK_NAME: &str = "fela-dom";

/// Writes every change into the style nodes of the documents it is delivered
/// to. Attached once per renderer.
#[derive(Debug, Default)]
pub struct DomSink;

impl DomSink {
    pub fn new() -> Self {
        Self
    }

    fn clear(ctx: &mut SinkContext<'_>) {
        for (key, entry) in ctx.nodes.iter() {
            let target = ctx
                .documents
                .iter()
                .find(|document| document.ref_id == key.ref_id)
                .and_then(|document| document.target.as_ref());

            if let Some(target) = target {
                target.borrow_mut().remove_node(entry.node);
            }
        }

        ctx.nodes.clear();
        ctx.score_index.clear();
    }
}

impl Listener for DomSink {
    fn on_change(&mut self, change: &Change, ctx: &mut SinkContext<'_>) {
        if matches!(change, Change::Clear) {
            debug!(nodes = ctx.nodes.len(), "Removing rendered style nodes");
            Self::clear(ctx);
            return;
        }

        let documents: Vec<(u32, DocumentHandle)> = ctx
            .documents
            .iter()
            .filter_map(|document| document.target.clone().map(|target| (document.ref_id, target)))
            .collect();

        for (ref_id, target) in documents {
            let key = NodeKey::for_change(change, ref_id);
            let mut document = target.borrow_mut();
            let node_id = get_node(&mut document, &key, ctx);

            let Some(node) = document.node_mut(node_id) else {
                continue;
            };
            trace!(ref_id, kind = %key.kind, replay = ctx.replay, "Applying change");

            match change {
                Change::Keyframe { keyframe, .. } => append_once(node, keyframe),
                Change::Font { font_face, .. } => append_once(node, font_face),
                Change::Static { css, selector } => match selector {
                    Some(selector) => append_once(node, &generate_css_rule(selector, css)),
                    None => append_once(node, css),
                },
                Change::Rule { .. } => insert_rule(change, node, &key, ctx),
                Change::Clear => {}
            }
        }
    }

    fn name(&self) -> &str {
        SINK_NAME
    }
}

/// Text already present (e.g. server-rendered) is not added again
fn append_once(node: &mut StyleNode, css: &str) {
    if !node.text_content().contains(css) {
        node.append_text(css);
    }
}

/// Attach the sink to a renderer once. Documents the renderer already knows
/// receive everything rendered so far. Returns whether it was attached now.
pub fn attach(renderer: &mut Renderer) -> bool {
    if renderer.has_listener(SINK_NAME) {
        return false;
    }

    renderer.subscribe(DomSink::new());

    let known: Vec<u32> = renderer
        .document_refs()
        .iter()
        .filter(|document| document.target.is_some())
        .map(|document| document.ref_id)
        .collect();
    for ref_id in known {
        renderer.replay_document(ref_id);
    }

    true
}

/// Render into `document` from now on. The returned subscription detaches it
/// again through `Renderer::unsubscribe_document`.
#[instrument(skip_all)]
pub fn render(renderer: &mut Renderer, document: &DocumentHandle) -> DocumentSubscription {
    attach(renderer);
    renderer.subscribe_document(document)
}
