pub mod class_name;
pub mod cssify;
pub mod font;
pub mod reference;
pub mod score;
pub mod selector;
pub mod types;

pub use class_name::{
    generate_animation_name, generate_class_name, generate_unique_class_name, is_safe_class_name,
    is_valid_selector_prefix,
};
pub use cssify::{
    cssify_declaration, cssify_font_face, cssify_keyframe, cssify_object, cssify_value,
    hyphenate_property, is_undefined_value, minify_css_string, to_css_string,
};
pub use font::{generate_font_source, get_font_format, FontError, FontProperties, FontResult};
pub use reference::{
    canonical_json, generate_declaration_reference, generate_font_reference,
    generate_keyframe_reference, generate_static_style_reference, generate_static_text_reference,
};
pub use score::{calculate_node_score, get_rule_score, DEFAULT_RULE_ORDER};
pub use selector::{
    classify_key, extract_media_query, extract_support_query, generate_combined_media_query,
    generate_css_media_rule, generate_css_rule, generate_css_selector, generate_css_support_rule,
    is_media_query, is_nested_selector, is_support, normalize_nested_property, KeyKind,
};
pub use types::{Change, StyleType, UnknownStyleType};
