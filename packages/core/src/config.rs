use crate::document::DocumentHandle;
use crate::error::{ConfigError, ConfigResult, DevWarning};
use crate::plugin::{Enhancer, Plugin};
use anyhow::Context;
use fela_utils::{is_safe_class_name, is_valid_selector_prefix, DEFAULT_RULE_ORDER};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const DEFAULT_CONFIG_NAME: &str = "fela.config.json";

/// Serializable renderer options (`fela.config.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererOptions {
    /// Vendor prefixes for `@keyframes`; the unprefixed variant is always added
    #[serde(default = "default_keyframe_prefixes")]
    pub keyframe_prefixes: Vec<String>,

    /// Media queries in the order their stylesheets should cascade
    #[serde(default)]
    pub media_query_order: Vec<String>,

    /// Support queries in the order their stylesheets should cascade
    #[serde(default)]
    pub support_query_order: Vec<String>,

    /// Pseudo class patterns (regex source) ordering rules inside a sheet
    #[serde(default = "default_rule_order")]
    pub rule_order: Vec<String>,

    /// Prepended to every generated class name
    #[serde(default)]
    pub selector_prefix: String,

    #[serde(default)]
    pub dev_mode: bool,

    /// Extra attributes put on every created style node (e.g. `nonce`)
    #[serde(default)]
    pub style_node_attributes: BTreeMap<String, String>,
}

fn default_keyframe_prefixes() -> Vec<String> {
    vec!["-webkit-".to_string(), "-moz-".to_string()]
}

fn default_rule_order() -> Vec<String> {
    DEFAULT_RULE_ORDER.iter().map(|s| s.to_string()).collect()
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            keyframe_prefixes: default_keyframe_prefixes(),
            media_query_order: vec![],
            support_query_order: vec![],
            rule_order: default_rule_order(),
            selector_prefix: String::new(),
            dev_mode: false,
            style_node_attributes: BTreeMap::new(),
        }
    }
}

impl RendererOptions {
    /// Load options from `fela.config.json` in a directory, or defaults if
    /// there is none
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(dir.as_ref()).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let options = Self::from_json(&content)?;
            Ok(options)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let options: RendererOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Strict check of everything the renderer would otherwise drop with a
    /// warning
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_valid_selector_prefix(&self.selector_prefix) {
            return Err(ConfigError::InvalidSelectorPrefix {
                prefix: self.selector_prefix.clone(),
            });
        }

        for pattern in &self.rule_order {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidRuleOrder {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Settings a renderer created from these options runs with
    pub fn compile_settings(&self) -> RendererSettings {
        self.compile().0
    }

    /// Resolve into the settings a renderer runs with. Invalid values are
    /// dropped and reported as warnings.
    pub(crate) fn compile(&self) -> (RendererSettings, Vec<DevWarning>) {
        let mut warnings = Vec::new();

        let mut keyframe_prefixes = self.keyframe_prefixes.clone();
        if !keyframe_prefixes.iter().any(|prefix| prefix.is_empty()) {
            keyframe_prefixes.push(String::new());
        }

        let rule_order = self
            .rule_order
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(_) => {
                    warnings.push(DevWarning::InvalidRuleOrder {
                        pattern: pattern.clone(),
                    });
                    None
                }
            })
            .collect();

        let selector_prefix = if is_valid_selector_prefix(&self.selector_prefix) {
            self.selector_prefix.clone()
        } else {
            warnings.push(DevWarning::InvalidSelectorPrefix {
                prefix: self.selector_prefix.clone(),
            });
            String::new()
        };

        let settings = RendererSettings {
            keyframe_prefixes,
            media_query_order: self.media_query_order.clone(),
            support_query_order: self.support_query_order.clone(),
            rule_order,
            selector_prefix,
            dev_mode: self.dev_mode,
            style_node_attributes: self.style_node_attributes.clone(),
        };

        (settings, warnings)
    }
}

/// Settings a renderer runs with, shared with listeners
#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub keyframe_prefixes: Vec<String>,
    pub media_query_order: Vec<String>,
    pub support_query_order: Vec<String>,
    pub rule_order: Vec<Regex>,
    pub selector_prefix: String,
    pub dev_mode: bool,
    pub style_node_attributes: BTreeMap<String, String>,
}

pub type ClassNameFilter = Rc<dyn Fn(&str) -> bool>;

/// Everything `Renderer::new` needs: serializable options plus plugins,
/// enhancers, the class-name filter and the ambient document
pub struct RendererConfig {
    pub options: RendererOptions,
    pub(crate) plugins: Vec<Rc<dyn Plugin>>,
    pub(crate) enhancers: Vec<Enhancer>,
    pub(crate) filter_class_name: ClassNameFilter,
    pub(crate) document: Option<DocumentHandle>,
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::from_options(RendererOptions::default())
    }

    pub fn from_options(options: RendererOptions) -> Self {
        Self {
            options,
            plugins: Vec::new(),
            enhancers: Vec::new(),
            filter_class_name: Rc::new(is_safe_class_name),
            document: None,
        }
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Rc::new(plugin));
        self
    }

    pub fn with_enhancer(mut self, enhancer: impl FnOnce(crate::Renderer) -> crate::Renderer + 'static) -> Self {
        self.enhancers.push(Box::new(enhancer));
        self
    }

    pub fn with_filter_class_name(mut self, filter: impl Fn(&str) -> bool + 'static) -> Self {
        self.filter_class_name = Rc::new(filter);
        self
    }

    /// Document targeted by the default document ref
    pub fn with_document(mut self, document: DocumentHandle) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_selector_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.selector_prefix = prefix.into();
        self
    }

    pub fn with_keyframe_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.options.keyframe_prefixes = prefixes;
        self
    }

    pub fn with_media_query_order(mut self, order: Vec<String>) -> Self {
        self.options.media_query_order = order;
        self
    }

    pub fn with_support_query_order(mut self, order: Vec<String>) -> Self {
        self.options.support_query_order = order;
        self
    }

    pub fn with_rule_order(mut self, order: Vec<String>) -> Self {
        self.options.rule_order = order;
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.options.dev_mode = dev_mode;
        self
    }

    pub fn with_style_node_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .style_node_attributes
            .insert(name.into(), value.into());
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RendererConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererConfig")
            .field("options", &self.options)
            .field("plugins", &self.plugins.len())
            .field("enhancers", &self.enhancers.len())
            .field("document", &self.document.is_some())
            .finish()
    }
}
