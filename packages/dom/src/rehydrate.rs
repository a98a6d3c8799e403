//! Rebuilding renderer state from style nodes that are already in a document

use crate::connection::{MEDIA_ATTRIBUTE, REHYDRATION_ATTRIBUTE, SUPPORT_ATTRIBUTE, TYPE_ATTRIBUTE};
use crate::sink::attach;
use fela::{CacheEntry, DocumentRef, NodeEntry, NodeId, NodeKey, Renderer, StyleNode, VirtualDocument};
use fela_utils::{
    calculate_node_score, cssify_keyframe, generate_css_selector, generate_declaration_reference,
    generate_font_reference, generate_keyframe_reference, get_rule_score, Change, FontProperties,
    StyleType,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

static DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[.]([0-9a-z_-]+)([^{]+)?\{([^:]+):([^}]+)\}").unwrap());
static SUPPORT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)@supports\s*([^{]+)\{((?:[^{}]*\{[^{}]*\})*)\s*\}").unwrap()
});
static CLASS_SELECTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[.][a-z0-9_-]*").unwrap());
static LOCAL_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"local\(\s*['"]?([^'")]+?)['"]?\s*\)"#).unwrap());
static ANIMATION_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^k(\d+)$").unwrap());

/// Attach the DOM sink and restore counters, nodes, score index and cache
/// from the marked style nodes of every attached document, so rendering
/// continues where the server stopped.
#[instrument(skip_all)]
pub fn rehydrate(renderer: &mut Renderer) {
    attach(renderer);

    let documents: Vec<DocumentRef> = renderer.document_refs().to_vec();
    for document_ref in documents {
        let Some(target) = document_ref.target else {
            continue;
        };

        let mut document = target.borrow_mut();
        for node_id in document.nodes_with_attribute(TYPE_ATTRIBUTE) {
            rehydrate_node(renderer, &mut document, node_id, document_ref.ref_id);
        }
    }
}

fn rehydrate_node(renderer: &mut Renderer, document: &mut VirtualDocument, node_id: NodeId, ref_id: u32) {
    let Some(node) = document.node_mut(node_id) else {
        return;
    };

    // negative, oversized or missing indices all mean "do not rehydrate"
    let Some(rehydration) = node
        .attribute(REHYDRATION_ATTRIBUTE)
        .and_then(|value| value.trim().parse::<u32>().ok())
    else {
        debug!(node = ?node_id, "Rehydration blocked for node");
        return;
    };

    let kind = match node.attribute(TYPE_ATTRIBUTE).unwrap_or("").parse::<StyleType>() {
        Ok(kind) => kind,
        Err(err) => {
            warn!(error = %err, "Skipping style node");
            return;
        }
    };
    let media = node.attribute(MEDIA_ATTRIBUTE).unwrap_or("").to_string();
    let support = node.attribute(SUPPORT_ATTRIBUTE).unwrap_or("").to_string();

    renderer.reserve_rule_identifier(rehydration);

    let settings = renderer.settings();
    let score = calculate_node_score(
        kind,
        &media,
        &support,
        &settings.media_query_order,
        &settings.support_query_order,
    );
    let key = NodeKey::new(kind, media, support, ref_id);
    renderer.nodes_mut().insert(
        key.clone(),
        NodeEntry {
            score,
            node: node_id,
        },
    );

    let css = node.css_text();
    match kind {
        StyleType::Rule => {
            rehydrate_rules(renderer, &css, &key);
            score_rules(renderer, node, &key);
        }
        StyleType::Keyframe => rehydrate_keyframes(renderer, &css),
        StyleType::Font => rehydrate_font_faces(renderer, &css),
        StyleType::Static | StyleType::Clear => {}
    }
}

/// Restore rule cache entries, keyed exactly like freshly rendered ones
fn rehydrate_rules(renderer: &mut Renderer, css: &str, key: &NodeKey) {
    if key.support.is_empty() {
        restore_declarations(renderer, css, &key.media, "");
        return;
    }

    for block in SUPPORT_BLOCK.captures_iter(css) {
        restore_declarations(renderer, &block[2], &key.media, block[1].trim());
    }
}

fn restore_declarations(renderer: &mut Renderer, css: &str, media: &str, support: &str) {
    for captures in DECLARATION.captures_iter(css) {
        let class_name = &captures[1];
        let pseudo = captures.get(2).map(|m| m.as_str()).unwrap_or("");
        let property = captures[3].trim();
        let value = &captures[4];

        let reference = generate_declaration_reference(property, value, pseudo, media, support);
        let change = Change::Rule {
            class_name: class_name.to_string(),
            selector: generate_css_selector(class_name, pseudo),
            declaration: format!("{}:{}", property, value),
            pseudo: pseudo.to_string(),
            media: media.to_string(),
            support: support.to_string(),
        };

        renderer.cache_mut().insert(reference, CacheEntry::Change(change));
    }
}

/// Score the parsed rules of a node and remember where order-insensitive
/// rules continue. Nodes without a parsed sheet are left alone.
fn score_rules(renderer: &mut Renderer, node: &mut StyleNode, key: &NodeKey) {
    let Some(sheet) = node.sheet_mut() else {
        debug!(media = %key.media, "Style node has no sheet, skipping rule scores");
        return;
    };

    let scores: Vec<u32> = sheet
        .rules()
        .iter()
        .map(|rule| {
            let pseudo = CLASS_SELECTOR.split(rule.selector_text()).nth(1).unwrap_or("");
            get_rule_score(&renderer.settings().rule_order, pseudo)
        })
        .collect();

    let mut first_base_rule = None;
    for (index, score) in scores.into_iter().enumerate() {
        sheet.set_score(index, score);
        if score == 0 && first_base_rule.is_none() {
            first_base_rule = Some(index);
        }
    }

    if let Some(index) = first_base_rule {
        renderer.score_index_mut().insert(key.clone(), index);
    }
}

/// Restore keyframes from their unprefixed `@keyframes` blocks
fn rehydrate_keyframes(renderer: &mut Renderer, css: &str) {
    for rule in fela::split_rules(css) {
        let Some((prelude, body)) = split_block(&rule) else {
            continue;
        };
        let Some(name) = prelude.strip_prefix("@keyframes") else {
            continue;
        };
        let name = name.trim();

        let mut frames = Map::new();
        for frame in fela::split_rules(body) {
            if let Some((step, declarations)) = split_block(&frame) {
                frames.insert(step.trim().to_string(), Value::Object(parse_declarations(declarations)));
            }
        }

        match ANIMATION_NAME.captures(name).map(|captures| captures[1].parse::<u32>()) {
            Some(Ok(id)) => renderer.reserve_keyframe_identifier(id),
            Some(Err(err)) => warn!(name, error = %err, "Keyframe counter not restored"),
            None => {}
        }

        let reference = generate_keyframe_reference(&frames);
        let keyframe = cssify_keyframe(&frames, name, &renderer.settings().keyframe_prefixes);
        renderer.cache_mut().insert(
            reference,
            CacheEntry::Change(Change::Keyframe {
                keyframe,
                name: name.to_string(),
            }),
        );
    }
}

fn rehydrate_font_faces(renderer: &mut Renderer, css: &str) {
    for rule in fela::split_rules(css) {
        let Some((prelude, body)) = split_block(&rule) else {
            continue;
        };
        if prelude.trim() != "@font-face" {
            continue;
        }

        let mut font_family = None;
        let mut properties = FontProperties::new();
        for (property, value) in parse_declarations(body) {
            match property.as_str() {
                "font-family" => font_family = value.as_str().map(str::to_string),
                "src" => {
                    properties.local_alias = LOCAL_SOURCE
                        .captures_iter(value.as_str().unwrap_or(""))
                        .map(|captures| captures[1].to_string())
                        .collect();
                }
                _ => {
                    properties.properties.insert(property, value);
                }
            }
        }

        let Some(font_family) = font_family else {
            warn!(rule = %rule, "Font face without a family");
            continue;
        };

        let reference = generate_font_reference(&font_family, &properties);
        renderer.cache_mut().insert(
            reference,
            CacheEntry::Change(Change::Font {
                font_face: rule.clone(),
                font_family,
            }),
        );
    }
}

/// `prelude{body}` → (`prelude`, `body`)
fn split_block(rule: &str) -> Option<(&str, &str)> {
    let open = rule.find('{')?;
    let body = rule.get(open + 1..rule.len().checked_sub(1)?)?;
    Some((&rule[..open], body))
}

/// `a:b;c:d` → `{a: b, c: d}`; `;` inside parentheses or quotes (data urls,
/// font lists) does not end a declaration
fn parse_declarations(css: &str) -> Map<String, Value> {
    let mut declarations = Map::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    let mut push = |declaration: &str| {
        if let Some((property, value)) = declaration.split_once(':') {
            let property = property.trim();
            if !property.is_empty() {
                declarations.insert(property.to_string(), Value::String(value.trim().to_string()));
            }
        }
    };

    for (offset, ch) in css.char_indices() {
        match (ch, quote) {
            ('"' | '\'', None) => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            ('(', None) => depth += 1,
            (')', None) => depth = depth.saturating_sub(1),
            (';', None) if depth == 0 => {
                push(&css[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    push(&css[start..]);

    declarations
}
