use fela_utils::StyleType;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rule order pattern '{pattern}': {source}")]
    InvalidRuleOrder {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid selector prefix '{prefix}'")]
    InvalidSelectorPrefix { prefix: String },

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Cannot insert rule at index {index}, sheet has {len} rules")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid CSS rule '{css}'")]
    InvalidRule { css: String },
}

/// Non-fatal problems reported while rendering
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DevWarning {
    #[error("The object key \"{key}\" is not a valid nested key. Maybe you forgot to add a plugin to resolve it?")]
    InvalidNestedKey { key: String },

    #[error("An invalid selectorPrefix ({prefix}) has been used and was ignored. It must match /^[a-z_][a-z0-9-_]*$/i")]
    InvalidSelectorPrefix { prefix: String },

    #[error("Ignoring invalid rule order pattern '{pattern}'")]
    InvalidRuleOrder { pattern: String },

    #[error("Static style without selector: {css}")]
    StaticWithoutSelector { css: String },

    #[error("The value of \"{property}\" is an object and was ignored")]
    InvalidDeclarationValue { property: String },

    #[error("No {kind} identifiers left, nothing was rendered")]
    IdentifiersExhausted { kind: StyleType },
}
