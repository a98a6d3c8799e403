pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod listener;
pub mod plugin;
pub mod renderer;
pub mod resolver;
pub mod stylesheet;
pub mod subscription;

pub use cache::{CacheEntry, RuleCache};
pub use config::{ClassNameFilter, RendererConfig, RendererOptions, RendererSettings, DEFAULT_CONFIG_NAME};
pub use document::{DocumentHandle, NodeId, StyleNode, VirtualDocument};
pub use error::{ConfigError, ConfigResult, DevWarning, SheetError, SheetResult};
pub use listener::{Listener, NodeEntry, NodeKey, NodeMap, ScoreIndex, SinkContext, SubscriptionId};
pub use plugin::{process_style_with_plugins, Enhancer, Plugin, Props, Style};
pub use renderer::{Renderer, StaticStyle};
pub use resolver::CLASS_NAME_KEY;
pub use stylesheet::{split_rules, SheetRule, StyleSheet};
pub use subscription::{DocumentRef, DocumentSubscription};

pub use fela_utils::{Change, FontProperties, StyleType};
