//! Flattening of nested style objects into atomic declarations

use crate::error::DevWarning;
use crate::plugin::{process_style_with_plugins, Props, Style};
use crate::renderer::Renderer;
use fela_utils::{
    classify_key, extract_media_query, extract_support_query, generate_combined_media_query,
    normalize_nested_property, KeyKind, StyleType,
};
use serde_json::Value;

/// Key whose string value is passed through as an existing class name
pub const CLASS_NAME_KEY: &str = "_className";

impl Renderer {
    /// Run a style through the plugins and render it to space separated
    /// class names, one per declaration in encounter order
    pub fn render_style(&mut self, style: Style, props: &Props) -> String {
        let processed = process_style_with_plugins(self, style, StyleType::Rule, props);

        let mut class_names = Vec::new();
        self.resolve_style(&processed, "", "", "", &mut class_names);
        class_names.join(" ")
    }

    fn resolve_style(
        &mut self,
        style: &Style,
        pseudo: &str,
        media: &str,
        support: &str,
        class_names: &mut Vec<String>,
    ) {
        if let Some(Value::String(class_name)) = style.get(CLASS_NAME_KEY) {
            if !class_name.is_empty() {
                class_names.push(class_name.clone());
            }
        }

        for (property, value) in style {
            if property == CLASS_NAME_KEY {
                continue;
            }

            match (classify_key(property, value), value.as_object()) {
                (KeyKind::Declaration, _) => {
                    let class_name = self.render_declaration(property, value, pseudo, media, support);
                    if !class_name.is_empty() {
                        class_names.push(class_name);
                    }
                }
                (KeyKind::NestedSelector, Some(nested)) => {
                    let pseudo = format!("{}{}", pseudo, normalize_nested_property(property));
                    self.resolve_style(nested, &pseudo, media, support, class_names);
                }
                (KeyKind::MediaQuery, Some(nested)) => {
                    let media = generate_combined_media_query(media, extract_media_query(property));
                    self.resolve_style(nested, pseudo, &media, support, class_names);
                }
                (KeyKind::SupportQuery, Some(nested)) => {
                    let support =
                        generate_combined_media_query(support, extract_support_query(property));
                    self.resolve_style(nested, pseudo, media, &support, class_names);
                }
                _ => self.report(DevWarning::InvalidNestedKey {
                    key: property.clone(),
                }),
            }
        }
    }
}
