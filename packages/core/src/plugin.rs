//! Style plugins and renderer enhancers

use crate::renderer::Renderer;
use fela_utils::StyleType;
use serde_json::{Map, Value};

/// A style object: CSS properties, nested selectors and query blocks in
/// encounter order
pub type Style = Map<String, Value>;

/// Props passed to rule and keyframe functions
pub type Props = Value;

/// A transform run over every style before it is resolved.
///
/// Plugins run in the order they were configured; each one receives the
/// previous plugin's output.
pub trait Plugin {
    fn process(&self, style: Style, kind: StyleType, renderer: &Renderer, props: &Props) -> Style;
}

impl<F> Plugin for F
where
    F: Fn(Style, StyleType, &Renderer, &Props) -> Style,
{
    fn process(&self, style: Style, kind: StyleType, renderer: &Renderer, props: &Props) -> Style {
        self(style, kind, renderer, props)
    }
}

/// A renderer → renderer transform applied once when the renderer is created
pub type Enhancer = Box<dyn FnOnce(Renderer) -> Renderer>;

/// Fold a style through the configured plugin pipeline
pub fn process_style_with_plugins(
    renderer: &Renderer,
    style: Style,
    kind: StyleType,
    props: &Props,
) -> Style {
    renderer
        .plugins()
        .iter()
        .fold(style, |style, plugin| plugin.process(style, kind, renderer, props))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use serde_json::json;

    fn object(value: Value) -> Style {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_plugins_run_in_order() {
        let renderer = Renderer::new(
            RendererConfig::new()
                .with_plugin(|mut style: Style, _: StyleType, _: &Renderer, _: &Props| {
                    style.insert("color".to_string(), json!("red"));
                    style
                })
                .with_plugin(|mut style: Style, _: StyleType, _: &Renderer, _: &Props| {
                    let color = style.get("color").cloned().unwrap_or(Value::Null);
                    style.insert("borderColor".to_string(), color);
                    style
                }),
        );

        let processed = process_style_with_plugins(
            &renderer,
            Style::new(),
            StyleType::Rule,
            &Value::Null,
        );
        assert_eq!(
            Value::Object(processed),
            json!({ "color": "red", "borderColor": "red" })
        );
    }

    #[test]
    fn test_plugins_see_type_and_props() {
        let renderer = Renderer::new(RendererConfig::new().with_plugin(
            |mut style: Style, kind: StyleType, _: &Renderer, props: &Props| {
                if kind == StyleType::Keyframe {
                    style.insert("kind".to_string(), json!(kind.as_str()));
                }
                if let Some(size) = props.get("size") {
                    style.insert("width".to_string(), size.clone());
                }
                style
            },
        ));

        let processed = process_style_with_plugins(
            &renderer,
            object(json!({})),
            StyleType::Keyframe,
            &json!({ "size": 10 }),
        );
        assert_eq!(
            Value::Object(processed),
            json!({ "kind": "KEYFRAME", "width": 10 })
        );
    }
}
