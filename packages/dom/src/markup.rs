//! `<style>` markup: the wire format between server rendering and
//! rehydration

use fela::{StyleNode, VirtualDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static STYLE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<style\b([^>]*)>").unwrap());
static STYLE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</style\s*>").unwrap());
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap()
});

pub type MarkupResult<T> = Result<T, MarkupError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    #[error("Unclosed <style> tag at offset {offset}")]
    UnclosedStyleTag { offset: usize },

    #[error("Unexpected content at offset {offset}: '{snippet}'")]
    UnexpectedContent { offset: usize, snippet: String },
}

/// Parse a sequence of `<style>` tags into a document
pub fn parse_markup(markup: &str) -> MarkupResult<VirtualDocument> {
    let mut document = VirtualDocument::new();
    let mut offset = 0;

    while offset < markup.len() {
        let rest = &markup[offset..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let start = offset + (rest.len() - trimmed.len());

        let open = match STYLE_OPEN.captures(trimmed) {
            Some(captures) if captures.get(0).map(|m| m.start()) == Some(0) => captures,
            _ => {
                return Err(MarkupError::UnexpectedContent {
                    offset: start,
                    snippet: trimmed.chars().take(20).collect(),
                })
            }
        };

        let tag_end = start + open.get(0).map(|m| m.end()).unwrap_or(0);
        let attributes = parse_attributes(open.get(1).map(|m| m.as_str()).unwrap_or(""));

        let close = STYLE_CLOSE
            .find(&markup[tag_end..])
            .ok_or(MarkupError::UnclosedStyleTag { offset: start })?;

        let css = &markup[tag_end..tag_end + close.start()];
        document.append_style_node(&attributes, css);
        offset = tag_end + close.end();
    }

    Ok(document)
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(source)
        .map(|captures| {
            let name = captures[1].to_string();
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .or_else(|| captures.get(4))
                .map(|m| unescape_attribute(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Serialize one style node
pub fn style_tag_markup(attributes: &[(&str, &str)], css: &str) -> String {
    let mut markup = String::from("<style");
    for (name, value) in attributes {
        markup.push(' ');
        markup.push_str(name);
        markup.push_str("=\"");
        markup.push_str(&escape_attribute(value));
        markup.push('"');
    }
    markup.push('>');
    markup.push_str(css);
    markup.push_str("</style>");
    markup
}

/// Serialize the style nodes of a document, in document order
pub fn serialize_document(document: &VirtualDocument) -> String {
    document.style_nodes().iter().map(node_markup).collect()
}

fn node_markup(node: &StyleNode) -> String {
    let attributes: Vec<(&str, &str)> = node.attributes().collect();
    style_tag_markup(&attributes, &node.css_text())
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn unescape_attribute(value: &str) -> String {
    value.replace("&quot;", "\"").replace("&amp;", "&")
}
