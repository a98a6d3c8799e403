//! Classification of style object keys and selector helpers

use serde_json::Value;

/// What a key of a style object stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// A literal CSS property
    Declaration,
    /// Pseudo class, attribute selector or combinator (`:hover`, `[disabled]`, `> div`, `&.active`)
    NestedSelector,
    /// `@media <query>` block
    MediaQuery,
    /// `@supports <query>` block
    SupportQuery,
    /// An object under a key that is none of the above
    Invalid,
}

/// Classify a style key once so the resolver can dispatch on the variant
pub fn classify_key(key: &str, value: &Value) -> KeyKind {
    if !value.is_object() {
        return KeyKind::Declaration;
    }

    if is_nested_selector(key) {
        KeyKind::NestedSelector
    } else if is_media_query(key) {
        KeyKind::MediaQuery
    } else if is_support(key) {
        KeyKind::SupportQuery
    } else {
        KeyKind::Invalid
    }
}

pub fn is_nested_selector(property: &str) -> bool {
    matches!(
        property.chars().next(),
        Some(':' | '[' | '>' | '&' | '+' | '~')
    )
}

pub fn is_media_query(property: &str) -> bool {
    property.starts_with("@media")
}

pub fn is_support(property: &str) -> bool {
    property.starts_with("@supports")
}

/// Strip the leading `&` parent reference of a nested selector
pub fn normalize_nested_property(property: &str) -> &str {
    property.strip_prefix('&').unwrap_or(property)
}

/// Query text of an `@media` key
pub fn extract_media_query(property: &str) -> &str {
    property.get(6..).unwrap_or("").trim()
}

/// Query text of an `@supports` key
pub fn extract_support_query(property: &str) -> &str {
    property.get(9..).unwrap_or("").trim()
}

/// Combine an outer and a nested query with a logical AND
pub fn generate_combined_media_query(current: &str, nested: &str) -> String {
    if current.is_empty() {
        nested.to_string()
    } else {
        format!("{} and {}", current, nested)
    }
}

pub fn generate_css_selector(class_name: &str, pseudo: &str) -> String {
    format!(".{}{}", class_name, pseudo)
}

pub fn generate_css_rule(selector: &str, declaration: &str) -> String {
    format!("{}{{{}}}", selector, declaration)
}

pub fn generate_css_support_rule(support: &str, css_rule: &str) -> String {
    format!("@supports {}{{{}}}", support, css_rule)
}

pub fn generate_css_media_rule(media: &str, css: &str) -> String {
    format!("@media {}{{{}}}", media, css)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_key() {
        let nested = json!({ "color": "blue" });
        assert_eq!(classify_key("color", &json!("red")), KeyKind::Declaration);
        assert_eq!(classify_key(":hover", &nested), KeyKind::NestedSelector);
        assert_eq!(classify_key("& > div", &nested), KeyKind::NestedSelector);
        assert_eq!(classify_key("[disabled]", &nested), KeyKind::NestedSelector);
        assert_eq!(
            classify_key("@media (min-width: 300px)", &nested),
            KeyKind::MediaQuery
        );
        assert_eq!(
            classify_key("@supports (display: grid)", &nested),
            KeyKind::SupportQuery
        );
        assert_eq!(classify_key("foo", &nested), KeyKind::Invalid);
        // A selector-looking key with a primitive value is still a declaration
        assert_eq!(classify_key(":hover", &json!("x")), KeyKind::Declaration);
    }

    #[test]
    fn test_normalize_nested_property() {
        assert_eq!(normalize_nested_property("&:hover"), ":hover");
        assert_eq!(normalize_nested_property(":hover"), ":hover");
        assert_eq!(normalize_nested_property("& > div"), " > div");
    }

    #[test]
    fn test_extract_queries() {
        assert_eq!(extract_media_query("@media (min-width: 300px)"), "(min-width: 300px)");
        assert_eq!(extract_support_query("@supports (display:grid)"), "(display:grid)");
        assert_eq!(extract_media_query("@media"), "");
    }

    #[test]
    fn test_combined_media_query() {
        assert_eq!(generate_combined_media_query("", "screen"), "screen");
        assert_eq!(
            generate_combined_media_query("screen", "(min-width: 300px)"),
            "screen and (min-width: 300px)"
        );
    }

    #[test]
    fn test_css_rule_helpers() {
        assert_eq!(generate_css_selector("a", ":hover"), ".a:hover");
        assert_eq!(generate_css_rule(".a", "color:red"), ".a{color:red}");
        assert_eq!(
            generate_css_support_rule("(display:grid)", ".a{display:grid}"),
            "@supports (display:grid){.a{display:grid}}"
        );
        assert_eq!(
            generate_css_media_rule("screen", ".a{color:red}"),
            "@media screen{.a{color:red}}"
        );
    }
}
