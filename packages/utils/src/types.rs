use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of style a change record (and a stylesheet node) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StyleType {
    Rule,
    Keyframe,
    Font,
    Static,
    Clear,
}

impl StyleType {
    /// Marker used in `data-fela-type` attributes
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleType::Rule => "RULE",
            StyleType::Keyframe => "KEYFRAME",
            StyleType::Font => "FONT",
            StyleType::Static => "STATIC",
            StyleType::Clear => "CLEAR",
        }
    }
}

impl fmt::Display for StyleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown style type '{0}'")]
pub struct UnknownStyleType(pub String);

impl FromStr for StyleType {
    type Err = UnknownStyleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RULE" => Ok(StyleType::Rule),
            "KEYFRAME" => Ok(StyleType::Keyframe),
            "FONT" => Ok(StyleType::Font),
            "STATIC" => Ok(StyleType::Static),
            "CLEAR" => Ok(StyleType::Clear),
            other => Err(UnknownStyleType(other.to_string())),
        }
    }
}

/// A change record emitted to listeners whenever new CSS has been computed.
///
/// Records are immutable once stored in the renderer cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Change {
    #[serde(rename_all = "camelCase")]
    Rule {
        class_name: String,
        selector: String,
        declaration: String,
        pseudo: String,
        media: String,
        support: String,
    },

    #[serde(rename_all = "camelCase")]
    Keyframe { keyframe: String, name: String },

    #[serde(rename_all = "camelCase")]
    Font {
        font_face: String,
        font_family: String,
    },

    #[serde(rename_all = "camelCase")]
    Static {
        css: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },

    Clear,
}

impl Change {
    pub fn style_type(&self) -> StyleType {
        match self {
            Change::Rule { .. } => StyleType::Rule,
            Change::Keyframe { .. } => StyleType::Keyframe,
            Change::Font { .. } => StyleType::Font,
            Change::Static { .. } => StyleType::Static,
            Change::Clear => StyleType::Clear,
        }
    }

    /// Media query of a rule change, empty for every other kind
    pub fn media(&self) -> &str {
        match self {
            Change::Rule { media, .. } => media,
            _ => "",
        }
    }

    /// Support query of a rule change, empty for every other kind
    pub fn support(&self) -> &str {
        match self {
            Change::Rule { support, .. } => support,
            _ => "",
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Change::Rule { class_name, .. } => Some(class_name),
            _ => None,
        }
    }
}
