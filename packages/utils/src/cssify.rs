//! Turning structured style values into CSS text

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Convert a camelCase property name to its CSS form.
///
/// `backgroundColor` → `background-color`, `msTransform` → `-ms-transform`.
/// Custom properties (`--brand`) are kept verbatim.
pub fn hyphenate_property(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }

    let mut hyphenated = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            hyphenated.push('-');
            hyphenated.push(ch.to_ascii_lowercase());
        } else {
            hyphenated.push(ch);
        }
    }

    if hyphenated.starts_with("ms-") {
        hyphenated.insert(0, '-');
    }

    hyphenated
}

/// Whether a value marks an absent declaration.
///
/// `null` and any string containing `undefined` (the result of interpolating a
/// missing prop) are skipped without producing CSS or a class name.
pub fn is_undefined_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.contains("undefined"),
        _ => false,
    }
}

/// Textual CSS form of a declaration value, `None` for values that cannot be
/// written as a declaration (objects, null)
pub fn cssify_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(cssify_value).collect();
            Some(parts.join(","))
        }
        Value::Null | Value::Object(_) => None,
    }
}

pub fn cssify_declaration(property: &str, value: &str) -> String {
    format!("{}:{}", hyphenate_property(property), value)
}

/// Serialize the flat declarations of a style object, `;`-separated.
///
/// Nested objects and undefined values are ignored.
pub fn cssify_object(style: &Map<String, Value>) -> String {
    let mut css = String::new();

    for (property, value) in style {
        if !matches!(value, Value::String(_) | Value::Number(_)) || is_undefined_value(value) {
            continue;
        }

        if let Some(value) = cssify_value(value) {
            if !css.is_empty() {
                css.push(';');
            }
            css.push_str(&cssify_declaration(property, &value));
        }
    }

    css
}

/// Build a keyframe block for every prefix, e.g.
/// `@-webkit-keyframes k1{from{color:red}to{color:blue}}@keyframes k1{...}`
pub fn cssify_keyframe(frames: &Map<String, Value>, animation_name: &str, prefixes: &[String]) -> String {
    let mut body = String::new();
    for (percentage, frame) in frames {
        if let Value::Object(declarations) = frame {
            body.push_str(percentage);
            body.push('{');
            body.push_str(&cssify_object(declarations));
            body.push('}');
        }
    }

    prefixes
        .iter()
        .map(|prefix| format!("@{}keyframes {}{{{}}}", prefix, animation_name, body))
        .collect()
}

pub fn cssify_font_face(font_face: &Map<String, Value>) -> String {
    format!("@font-face{{{}}}", cssify_object(font_face))
}

/// Drop whitespace runs from hand-written static CSS
pub fn minify_css_string(css: &str) -> String {
    WHITESPACE_RUNS.replace_all(css, "").into_owned()
}

/// Quote a font family so it is safe to use as a CSS string
pub fn to_css_string(value: &str) -> String {
    if value.starts_with('"') {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    }
}
