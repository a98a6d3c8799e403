//! Finding, creating and filling the style nodes of a document

use fela::{NodeEntry, NodeId, NodeKey, SinkContext, StyleNode, VirtualDocument};
use fela_utils::{
    calculate_node_score, generate_css_rule, generate_css_support_rule, get_rule_score, Change,
    StyleType,
};
use tracing::{debug, warn};

pub const TYPE_ATTRIBUTE: &str = "data-fela-type";
pub const SUPPORT_ATTRIBUTE: &str = "data-fela-support";
pub const MEDIA_ATTRIBUTE: &str = "media";
pub const REHYDRATION_ATTRIBUTE: &str = "data-fela-rehydration";

/// Whether a style node carries the markers of a node key
pub fn matches_markers(node: &StyleNode, kind: StyleType, media: &str, support: &str) -> bool {
    let attribute_matches = |name: &str, expected: &str| match node.attribute(name) {
        Some(value) => value == expected,
        None => expected.is_empty(),
    };

    node.attribute(TYPE_ATTRIBUTE) == Some(kind.as_str())
        && attribute_matches(MEDIA_ATTRIBUTE, media)
        && attribute_matches(SUPPORT_ATTRIBUTE, support)
}

/// Server-rendered node with the markers of `key`, if there is one
pub fn query_node(document: &VirtualDocument, key: &NodeKey) -> Option<NodeId> {
    document.find_node(|node| matches_markers(node, key.kind, &key.media, &key.support))
}

/// Create a node for `key` in front of the closest node with a higher score,
/// keeping the nodes of a document in ascending score order
pub fn create_node(
    document: &mut VirtualDocument,
    key: &NodeKey,
    score: u32,
    ctx: &SinkContext<'_>,
) -> NodeId {
    let mut attributes = vec![(TYPE_ATTRIBUTE.to_string(), key.kind.as_str().to_string())];
    if !key.support.is_empty() {
        attributes.push((SUPPORT_ATTRIBUTE.to_string(), key.support.clone()));
    }
    if !key.media.is_empty() {
        attributes.push((MEDIA_ATTRIBUTE.to_string(), key.media.clone()));
    }
    for (name, value) in &ctx.settings.style_node_attributes {
        attributes.push((name.clone(), value.clone()));
    }

    let more_specific = ctx
        .nodes
        .iter()
        .filter(|(other, entry)| other.ref_id == key.ref_id && entry.score > score)
        .min_by_key(|(_, entry)| entry.score)
        .map(|(_, entry)| entry.node);

    debug!(kind = %key.kind, media = %key.media, support = %key.support, score, "Creating style node");
    document.insert_style_node(&attributes, more_specific)
}

/// Node that holds changes of `key`: the known one, a server-rendered one, or
/// a new one
pub fn get_node(document: &mut VirtualDocument, key: &NodeKey, ctx: &mut SinkContext<'_>) -> NodeId {
    if let Some(entry) = ctx.nodes.get(key) {
        if document.node(entry.node).is_some() {
            return entry.node;
        }
    }

    let score = calculate_node_score(
        key.kind,
        &key.media,
        &key.support,
        &ctx.settings.media_query_order,
        &ctx.settings.support_query_order,
    );
    let node = match query_node(document, key) {
        Some(node) => node,
        None => create_node(document, key, score, ctx),
    };

    ctx.nodes.insert(key.clone(), NodeEntry { score, node });
    node
}

/// Insert a rule change into its node so that rules stay ordered by their
/// pseudo class score. Order-insensitive rules continue after the last one
/// inserted; scored rules go in front of the first rule with a higher score.
pub fn insert_rule(change: &Change, node: &mut StyleNode, key: &NodeKey, ctx: &mut SinkContext<'_>) {
    let Change::Rule {
        selector,
        declaration,
        pseudo,
        support,
        ..
    } = change
    else {
        return;
    };

    let css_rule = generate_css_rule(selector, declaration);
    let css_rule = if support.is_empty() {
        css_rule
    } else {
        generate_css_support_rule(support, &css_rule)
    };

    let score = get_rule_score(&ctx.settings.rule_order, pseudo);

    if node.sheet().is_none() {
        // without a parsed sheet only the text can be extended
        if !node.text_content().contains(&css_rule) {
            node.append_text(&css_rule);
        }
        return;
    }
    let Some(sheet) = node.sheet_mut() else {
        return;
    };

    let index = if score == 0 {
        ctx.score_index
            .get(key)
            .map(|last| (last + 1).min(sheet.len()))
            .unwrap_or(0)
    } else {
        sheet
            .rules()
            .iter()
            .position(|rule| rule.score > score)
            .unwrap_or(sheet.len())
    };

    match sheet.insert_rule(&css_rule, index) {
        Ok(index) => {
            sheet.set_score(index, score);
            if score == 0 {
                ctx.score_index.insert(key.clone(), index);
            }
        }
        Err(err) => warn!(error = %err, rule = %css_rule, "Failed to insert rule"),
    }
}
