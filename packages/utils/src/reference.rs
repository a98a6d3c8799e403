//! Content-addressed cache references.
//!
//! A reference is derived purely from what is being rendered. Two requests
//! with the same semantic content always produce the same reference, no matter
//! how their style objects were spelled (key order, camelCase vs. hyphenated
//! property names, numbers vs. numeric strings). References are only ever used
//! as cache keys.

use crate::cssify::{cssify_value, hyphenate_property, is_undefined_value};
use crate::font::FontProperties;
use serde_json::{json, Map, Value};

/// Reference of a single declaration in its pseudo/media/support context
pub fn generate_declaration_reference(
    property: &str,
    value: &str,
    pseudo: &str,
    media: &str,
    support: &str,
) -> String {
    json!([support, media, pseudo, hyphenate_property(property), value]).to_string()
}

/// Reference of a (plugin-processed) keyframe definition
pub fn generate_keyframe_reference(frames: &Map<String, Value>) -> String {
    let normalized: Map<String, Value> = frames
        .iter()
        .filter_map(|(step, frame)| match frame {
            Value::Object(declarations) => Some((
                step.trim().to_string(),
                Value::Object(normalize_declarations(declarations)),
            )),
            _ => None,
        })
        .collect();

    format!("KEYFRAME{}", canonical_json(&Value::Object(normalized)))
}

/// Reference of a font face: family plus its descriptors and local aliases.
/// The file list is deliberately not part of it.
pub fn generate_font_reference(family: &str, properties: &FontProperties) -> String {
    let value = json!({
        "family": family.trim_matches('"'),
        "localAlias": properties.local_alias,
        "properties": Value::Object(normalize_declarations(&properties.properties)),
    });

    format!("FONT{}", canonical_json(&value))
}

/// Reference of a raw static CSS string
pub fn generate_static_text_reference(css: &str, selector: Option<&str>) -> String {
    format!("STATIC{}", json!([selector, css]))
}

/// Reference of a static style object bound to a selector
pub fn generate_static_style_reference(style: &Map<String, Value>, selector: Option<&str>) -> String {
    format!(
        "STATIC{}",
        json!([selector, canonical_json(&Value::Object(style.clone()))])
    )
}

/// Flat declarations keyed by CSS property name with textual values; exactly
/// the entries `cssify_object` would emit
pub fn normalize_declarations(declarations: &Map<String, Value>) -> Map<String, Value> {
    declarations
        .iter()
        .filter(|(_, value)| matches!(value, Value::String(_) | Value::Number(_)))
        .filter(|(_, value)| !is_undefined_value(value))
        .filter_map(|(property, value)| {
            cssify_value(value).map(|text| (hyphenate_property(property), Value::String(text)))
        })
        .collect()
}

/// JSON text with object keys sorted at every level
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_declaration_reference_is_context_sensitive() {
        let base = generate_declaration_reference("color", "red", "", "", "");
        let hover = generate_declaration_reference("color", "red", ":hover", "", "");
        let media = generate_declaration_reference("color", "red", "", "screen", "");
        assert_ne!(base, hover);
        assert_ne!(base, media);
        assert_eq!(base, generate_declaration_reference("color", "red", "", "", ""));
    }

    #[test]
    fn test_declaration_reference_is_unambiguous() {
        // Plain concatenation would make these two collide
        let a = generate_declaration_reference("a", "bc", "", "", "");
        let b = generate_declaration_reference("ab", "c", "", "", "");
        assert_ne!(a, b);
    }

    #[test]
    fn test_declaration_reference_normalizes_property() {
        assert_eq!(
            generate_declaration_reference("backgroundColor", "red", "", "", ""),
            generate_declaration_reference("background-color", "red", "", "", "")
        );
    }

    #[test]
    fn test_keyframe_reference_ignores_key_order() {
        let a = object(json!({
            "from": { "color": "red", "opacity": 0 },
            "to": { "color": "blue", "opacity": 1 }
        }));
        let b = object(json!({
            "to": { "opacity": "1", "color": "blue" },
            "from": { "opacity": 0, "color": "red" }
        }));
        assert_eq!(generate_keyframe_reference(&a), generate_keyframe_reference(&b));
    }

    #[test]
    fn test_font_reference() {
        let props = FontProperties::new().with_property("fontWeight", 300);
        let hyphenated = FontProperties::new().with_property("font-weight", "300");
        assert_eq!(
            generate_font_reference("Lato", &props),
            generate_font_reference("\"Lato\"", &hyphenated)
        );
        assert_ne!(
            generate_font_reference("Lato", &props),
            generate_font_reference("Lato", &FontProperties::new())
        );
    }

    #[test]
    fn test_static_references() {
        let style = object(json!({ "margin": 0 }));
        assert_ne!(
            generate_static_style_reference(&style, Some("body")),
            generate_static_style_reference(&style, Some("html"))
        );
        assert_ne!(
            generate_static_text_reference("body{margin:0}", None),
            generate_static_style_reference(&style, None)
        );
    }
}
