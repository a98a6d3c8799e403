use crate::cache::{CacheEntry, RuleCache};
use crate::config::{ClassNameFilter, RendererConfig, RendererSettings};
use crate::document::DocumentHandle;
use crate::error::DevWarning;
use crate::listener::{deliver, ListenerEntry, NodeMap, ScoreIndex, SinkContext};
use crate::plugin::{process_style_with_plugins, Plugin, Props, Style};
use crate::subscription::DocumentRef;
use fela_utils::{
    cssify_declaration, cssify_font_face, cssify_keyframe, cssify_object, cssify_value,
    generate_animation_name, generate_class_name, generate_css_selector,
    generate_declaration_reference, generate_font_reference, generate_font_source,
    generate_keyframe_reference, generate_static_style_reference, generate_static_text_reference,
    is_undefined_value, minify_css_string, to_css_string, Change, FontProperties, StyleType,
};
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{debug, instrument, warn};

/// Input of `Renderer::render_static`
#[derive(Debug, Clone, PartialEq)]
pub enum StaticStyle {
    /// Hand-written CSS, minified before it is emitted
    Css(String),
    /// Declarations for a selector, run through the plugins first
    Style(Style),
}

impl From<&str> for StaticStyle {
    fn from(css: &str) -> Self {
        StaticStyle::Css(css.to_string())
    }
}

impl From<String> for StaticStyle {
    fn from(css: String) -> Self {
        StaticStyle::Css(css)
    }
}

impl From<Style> for StaticStyle {
    fn from(style: Style) -> Self {
        StaticStyle::Style(style)
    }
}

/// The renderer: turns style objects into atomic class names, caches every
/// computed piece of CSS under a content-derived reference and emits each one
/// exactly once to its listeners.
pub struct Renderer {
    pub(crate) settings: RendererSettings,
    plugins: Vec<Rc<dyn Plugin>>,
    filter_class_name: ClassNameFilter,
    default_document: Option<DocumentHandle>,

    pub(crate) unique_rule_identifier: u32,
    pub(crate) unique_keyframe_identifier: u32,
    pub(crate) unique_document_identifier: u32,
    pub(crate) next_subscription_id: u64,

    pub(crate) listeners: Vec<ListenerEntry>,
    pub(crate) document_refs: Vec<DocumentRef>,
    pub(crate) nodes: NodeMap,
    pub(crate) score_index: ScoreIndex,
    pub(crate) cache: RuleCache,
    warnings: Vec<DevWarning>,
}

impl Renderer {
    /// Create a renderer. Invalid options are dropped with a warning, then
    /// the enhancers are applied in order.
    #[instrument(skip_all)]
    pub fn new(config: RendererConfig) -> Self {
        let RendererConfig {
            options,
            plugins,
            enhancers,
            filter_class_name,
            document,
        } = config;
        let (settings, warnings) = options.compile();

        let mut renderer = Self {
            settings,
            plugins,
            filter_class_name,
            default_document: document.clone(),
            unique_rule_identifier: 0,
            unique_keyframe_identifier: 0,
            unique_document_identifier: 0,
            next_subscription_id: 0,
            listeners: Vec::new(),
            document_refs: vec![DocumentRef::default_ref(document)],
            nodes: NodeMap::new(),
            score_index: ScoreIndex::new(),
            cache: RuleCache::new(),
            warnings: Vec::new(),
        };

        for warning in warnings {
            renderer.report(warning);
        }

        debug!(
            plugins = renderer.plugins.len(),
            enhancers = enhancers.len(),
            "Created renderer"
        );

        enhancers
            .into_iter()
            .fold(renderer, |renderer, enhancer| enhancer(renderer))
    }

    /// Resolve a rule function against props and render the resulting style
    pub fn render_rule<R>(&mut self, rule: R, props: &Props) -> String
    where
        R: Fn(&Props, &Renderer) -> Style,
    {
        let style = rule(props, self);
        self.render_style(style, props)
    }

    /// Class name of a single declaration in its context.
    ///
    /// Undefined values are remembered as skipped and yield an empty string.
    pub fn render_declaration(
        &mut self,
        property: &str,
        value: &Value,
        pseudo: &str,
        media: &str,
        support: &str,
    ) -> String {
        if value.is_object() {
            self.report(DevWarning::InvalidDeclarationValue {
                property: property.to_string(),
            });
            return String::new();
        }

        let value_text = cssify_value(value).unwrap_or_else(|| value.to_string());
        let reference = generate_declaration_reference(property, &value_text, pseudo, media, support);

        if let Some(entry) = self.cache.get(&reference) {
            return entry.class_name().to_string();
        }

        if is_undefined_value(value) {
            self.cache.insert(reference, CacheEntry::Skipped);
            return String::new();
        }

        let Some(class_name) = self.next_class_name() else {
            self.report(DevWarning::IdentifiersExhausted { kind: StyleType::Rule });
            return String::new();
        };
        let change = Change::Rule {
            selector: generate_css_selector(&class_name, pseudo),
            declaration: cssify_declaration(property, &value_text),
            class_name: class_name.clone(),
            pseudo: pseudo.to_string(),
            media: media.to_string(),
            support: support.to_string(),
        };

        self.store_and_emit(reference, change);
        class_name
    }

    /// Render a keyframe function to an animation name (`k1`, `k2`, ...)
    pub fn render_keyframe<K>(&mut self, keyframe: K, props: &Props) -> String
    where
        K: Fn(&Props, &Renderer) -> Style,
    {
        let resolved = keyframe(props, self);
        let processed = process_style_with_plugins(self, resolved, StyleType::Keyframe, props);
        let reference = generate_keyframe_reference(&processed);

        if let Some(Change::Keyframe { name, .. }) = self.cache.get(&reference).and_then(CacheEntry::change) {
            return name.clone();
        }

        let Some(id) = self.unique_keyframe_identifier.checked_add(1) else {
            self.report(DevWarning::IdentifiersExhausted {
                kind: StyleType::Keyframe,
            });
            return String::new();
        };
        self.unique_keyframe_identifier = id;
        let name = generate_animation_name(id);
        let keyframe = cssify_keyframe(&processed, &name, &self.settings.keyframe_prefixes);

        self.store_and_emit(
            reference,
            Change::Keyframe {
                keyframe,
                name: name.clone(),
            },
        );
        name
    }

    /// Register a font face and return its CSS-safe family name
    pub fn render_font<S: AsRef<str>>(
        &mut self,
        family: &str,
        files: &[S],
        properties: &FontProperties,
    ) -> String {
        let reference = generate_font_reference(family, properties);

        if let Some(Change::Font { font_family, .. }) = self.cache.get(&reference).and_then(CacheEntry::change) {
            return font_family.clone();
        }

        let font_family = to_css_string(family);
        let files: Vec<String> = files.iter().map(|file| file.as_ref().to_string()).collect();

        let mut font_face = properties.properties.clone();
        font_face.insert(
            "src".to_string(),
            Value::String(generate_font_source(&files, &properties.local_alias)),
        );
        font_face.insert("fontFamily".to_string(), Value::String(font_family.clone()));

        self.store_and_emit(
            reference,
            Change::Font {
                font_face: cssify_font_face(&font_face),
                font_family: font_family.clone(),
            },
        );
        font_family
    }

    /// Render global CSS, either as text or as declarations for `selector`
    pub fn render_static(&mut self, style: impl Into<StaticStyle>, selector: Option<&str>) {
        let style = style.into();
        let reference = match &style {
            StaticStyle::Css(css) => generate_static_text_reference(css, selector),
            StaticStyle::Style(style) => generate_static_style_reference(style, selector),
        };

        if self.cache.contains(&reference) {
            return;
        }

        let css = match style {
            StaticStyle::Css(css) => minify_css_string(&css),
            StaticStyle::Style(style) => {
                let props = Value::Object(Map::new());
                let processed = process_style_with_plugins(self, style, StyleType::Static, &props);
                let css = cssify_object(&processed);
                if selector.is_none() {
                    self.report(DevWarning::StaticWithoutSelector { css: css.clone() });
                }
                css
            }
        };

        self.store_and_emit(
            reference,
            Change::Static {
                css,
                selector: selector.map(str::to_string),
            },
        );
    }

    /// Forget everything rendered so far. Configuration and listeners are
    /// kept; every listener receives a clear change for the documents that
    /// were attached until now.
    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        self.unique_rule_identifier = 0;
        self.unique_keyframe_identifier = 0;
        self.unique_document_identifier = 0;
        self.cache.clear();

        let previous = std::mem::replace(
            &mut self.document_refs,
            vec![DocumentRef::default_ref(self.default_document.clone())],
        );

        let Renderer {
            listeners,
            nodes,
            score_index,
            settings,
            ..
        } = self;
        let mut ctx = SinkContext {
            documents: &previous,
            nodes,
            score_index,
            settings,
            replay: false,
        };
        deliver(listeners, &Change::Clear, &mut ctx);

        self.nodes.clear();
        self.score_index.clear();
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn plugins(&self) -> &[Rc<dyn Plugin>] {
        &self.plugins
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// Direct cache access, for restoring entries without emitting them
    pub fn cache_mut(&mut self) -> &mut RuleCache {
        &mut self.cache
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeMap {
        &mut self.nodes
    }

    pub fn score_index(&self) -> &ScoreIndex {
        &self.score_index
    }

    pub fn score_index_mut(&mut self) -> &mut ScoreIndex {
        &mut self.score_index
    }

    pub fn unique_rule_identifier(&self) -> u32 {
        self.unique_rule_identifier
    }

    pub fn unique_keyframe_identifier(&self) -> u32 {
        self.unique_keyframe_identifier
    }

    /// Raise the rule counter so new class names continue after `id`
    pub fn reserve_rule_identifier(&mut self, id: u32) {
        self.unique_rule_identifier = self.unique_rule_identifier.max(id);
    }

    /// Raise the keyframe counter so new animation names continue after `id`
    pub fn reserve_keyframe_identifier(&mut self, id: u32) {
        self.unique_keyframe_identifier = self.unique_keyframe_identifier.max(id);
    }

    /// Warnings recorded in dev mode
    pub fn warnings(&self) -> &[DevWarning] {
        &self.warnings
    }

    pub(crate) fn report(&mut self, warning: DevWarning) {
        warn!("{}", warning);
        if self.settings.dev_mode {
            self.warnings.push(warning);
        }
    }

    /// `None` once the rule identifiers are used up
    fn next_class_name(&mut self) -> Option<String> {
        let filter = Rc::clone(&self.filter_class_name);
        let counter = &mut self.unique_rule_identifier;

        let class_name = generate_class_name(
            || {
                *counter = counter.checked_add(1)?;
                Some(*counter)
            },
            |candidate: &str| filter(candidate),
        )?;

        Some(format!("{}{}", self.settings.selector_prefix, class_name))
    }

    fn store_and_emit(&mut self, reference: String, change: Change) {
        debug!(kind = %change.style_type(), reference = %reference, "Caching change");
        self.cache
            .insert(reference, CacheEntry::Change(change.clone()));
        self.emit(&change);
    }

    /// Deliver a change to every listener for every attached document
    fn emit(&mut self, change: &Change) {
        let Renderer {
            listeners,
            document_refs,
            nodes,
            score_index,
            settings,
            ..
        } = self;
        let mut ctx = SinkContext {
            documents: document_refs.as_slice(),
            nodes,
            score_index,
            settings,
            replay: false,
        };
        deliver(listeners, change, &mut ctx);
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("settings", &self.settings)
            .field("unique_rule_identifier", &self.unique_rule_identifier)
            .field("unique_keyframe_identifier", &self.unique_keyframe_identifier)
            .field("document_refs", &self.document_refs.len())
            .field("listeners", &self.listeners.len())
            .field("cache", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::SinkContext;
    use serde_json::json;
    use std::cell::RefCell;

    fn style(value: Value) -> Style {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn recorded(renderer: &mut Renderer) -> Rc<RefCell<Vec<Change>>> {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        renderer.subscribe(move |change: &Change, _: &mut SinkContext<'_>| {
            sink.borrow_mut().push(change.clone());
        });
        changes
    }

    #[test]
    fn test_render_declaration_is_cached() {
        let mut renderer = Renderer::new(RendererConfig::new());
        let changes = recorded(&mut renderer);

        let first = renderer.render_declaration("color", &json!("red"), "", "", "");
        let second = renderer.render_declaration("color", &json!("red"), "", "", "");
        assert_eq!(first, "a");
        assert_eq!(second, "a");
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(renderer.unique_rule_identifier(), 1);
    }

    #[test]
    fn test_undefined_declaration_is_skipped() {
        let mut renderer = Renderer::new(RendererConfig::new());
        let changes = recorded(&mut renderer);

        assert_eq!(renderer.render_declaration("color", &Value::Null, "", "", ""), "");
        assert_eq!(
            renderer.render_declaration("width", &json!("undefinedpx"), "", "", ""),
            ""
        );
        assert!(changes.borrow().is_empty());
        assert_eq!(renderer.cache().len(), 2);
        assert_eq!(renderer.unique_rule_identifier(), 0);
    }

    #[test]
    fn test_selector_prefix_and_filter() {
        let mut renderer = Renderer::new(
            RendererConfig::new()
                .with_selector_prefix("fela-")
                .with_filter_class_name(|name: &str| name != "b"),
        );

        assert_eq!(renderer.render_declaration("color", &json!("red"), "", "", ""), "fela-a");
        assert_eq!(renderer.render_declaration("color", &json!("blue"), "", "", ""), "fela-c");
    }

    #[test]
    fn test_rule_change_fields() {
        let mut renderer = Renderer::new(RendererConfig::new());
        let changes = recorded(&mut renderer);

        renderer.render_declaration("backgroundColor", &json!("red"), ":hover", "screen", "");
        assert_eq!(
            changes.borrow()[0],
            Change::Rule {
                class_name: "a".to_string(),
                selector: ".a:hover".to_string(),
                declaration: "background-color:red".to_string(),
                pseudo: ":hover".to_string(),
                media: "screen".to_string(),
                support: String::new(),
            }
        );
    }

    #[test]
    fn test_render_keyframe() {
        let mut renderer = Renderer::new(RendererConfig::new().with_keyframe_prefixes(vec![]));
        let changes = recorded(&mut renderer);

        let frames = |props: &Props, _: &Renderer| {
            style(json!({
                "from": { "color": "red" },
                "to": { "color": props.get("color").cloned().unwrap_or(json!("blue")) }
            }))
        };

        let name = renderer.render_keyframe(frames, &json!({}));
        assert_eq!(name, "k1");
        assert_eq!(renderer.render_keyframe(frames, &json!({})), "k1");
        assert_eq!(renderer.render_keyframe(frames, &json!({ "color": "green" })), "k2");

        let changes = changes.borrow();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            Change::Keyframe {
                keyframe: "@keyframes k1{from{color:red}to{color:blue}}".to_string(),
                name: "k1".to_string(),
            }
        );
    }

    #[test]
    fn test_render_font() {
        let mut renderer = Renderer::new(RendererConfig::new());
        let changes = recorded(&mut renderer);

        let properties = FontProperties::new()
            .with_local_alias("Lato")
            .with_property("fontWeight", 300);
        let family = renderer.render_font("Lato", &["fonts/lato.woff2"], &properties);
        assert_eq!(family, "\"Lato\"");
        renderer.render_font("Lato", &["fonts/lato.woff2"], &properties);

        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            Change::Font {
                font_face: "@font-face{font-weight:300;src:local('Lato'),url('fonts/lato.woff2') format('woff2');font-family:\"Lato\"}".to_string(),
                font_family: "\"Lato\"".to_string(),
            }
        );
    }

    #[test]
    fn test_render_static() {
        let mut renderer = Renderer::new(RendererConfig::new().with_dev_mode(true));
        let changes = recorded(&mut renderer);

        renderer.render_static("html,  body {  margin: 0 }", None);
        renderer.render_static("html,  body {  margin: 0 }", None);
        renderer.render_static(style(json!({ "marginTop": 0 })), Some("body"));
        renderer.render_static(style(json!({ "color": "red" })), None);

        let changes = changes.borrow();
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[0],
            Change::Static {
                css: "html,body {margin: 0 }".to_string(),
                selector: None,
            }
        );
        assert_eq!(
            changes[1],
            Change::Static {
                css: "margin-top:0".to_string(),
                selector: Some("body".to_string()),
            }
        );
        assert_eq!(
            renderer.warnings(),
            &[DevWarning::StaticWithoutSelector {
                css: "color:red".to_string()
            }]
        );
    }

    #[test]
    fn test_object_value_is_reported_and_skipped() {
        let mut renderer = Renderer::new(RendererConfig::new().with_dev_mode(true));
        let changes = recorded(&mut renderer);

        let class_name = renderer.render_declaration("color", &json!({ "a": 1 }), "", "", "");
        assert_eq!(class_name, "");
        assert!(changes.borrow().is_empty());
        assert!(renderer.cache().is_empty());
        assert_eq!(
            renderer.warnings(),
            &[DevWarning::InvalidDeclarationValue {
                property: "color".to_string()
            }]
        );
    }

    #[test]
    fn test_exhausted_rule_identifiers_render_nothing() {
        let mut renderer = Renderer::new(RendererConfig::new().with_dev_mode(true));
        let changes = recorded(&mut renderer);
        renderer.reserve_rule_identifier(u32::MAX);

        assert_eq!(renderer.render_declaration("color", &json!("red"), "", "", ""), "");
        assert!(changes.borrow().is_empty());
        assert_eq!(renderer.unique_rule_identifier(), u32::MAX);
        assert_eq!(
            renderer.warnings(),
            &[DevWarning::IdentifiersExhausted {
                kind: StyleType::Rule
            }]
        );
    }

    #[test]
    fn test_exhausted_keyframe_identifiers_render_nothing() {
        let mut renderer = Renderer::new(RendererConfig::new().with_dev_mode(true));
        let changes = recorded(&mut renderer);
        renderer.reserve_keyframe_identifier(u32::MAX);

        let name = renderer.render_keyframe(
            |_: &Props, _: &Renderer| style(json!({ "from": { "opacity": 0 } })),
            &Value::Null,
        );
        assert_eq!(name, "");
        assert!(changes.borrow().is_empty());
        assert_eq!(
            renderer.warnings(),
            &[DevWarning::IdentifiersExhausted {
                kind: StyleType::Keyframe
            }]
        );
    }

    #[test]
    fn test_enhancers_apply_in_order() {
        let renderer = Renderer::new(
            RendererConfig::new()
                .with_enhancer(|mut renderer: Renderer| {
                    renderer.reserve_rule_identifier(10);
                    renderer
                })
                .with_enhancer(|mut renderer: Renderer| {
                    renderer.reserve_keyframe_identifier(renderer.unique_rule_identifier() + 1);
                    renderer
                }),
        );
        assert_eq!(renderer.unique_rule_identifier(), 10);
        assert_eq!(renderer.unique_keyframe_identifier(), 11);
    }

    #[test]
    fn test_invalid_options_become_warnings() {
        let renderer = Renderer::new(
            RendererConfig::new()
                .with_selector_prefix("1bad")
                .with_dev_mode(true),
        );
        assert_eq!(renderer.settings().selector_prefix, "");
        assert_eq!(
            renderer.warnings(),
            &[DevWarning::InvalidSelectorPrefix {
                prefix: "1bad".to_string()
            }]
        );
    }
}
