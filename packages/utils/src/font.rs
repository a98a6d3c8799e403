//! `@font-face` source generation

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

pub type FontResult<T> = Result<T, FontError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FontError {
    #[error("Unknown font format for '{src}'")]
    UnknownFormat { src: String },
}

/// Extra properties passed to `render_font`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontProperties {
    /// Names tried through `local()` before downloading any file
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub local_alias: Vec<String>,

    /// Remaining `@font-face` descriptors (`fontWeight`, `fontStyle`, ...)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl FontProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_alias(mut self, alias: impl Into<String>) -> Self {
        self.local_alias.push(alias.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(alias) => vec![alias],
        OneOrMany::Many(aliases) => aliases,
    })
}

const FORMATS: &[(&str, &str)] = &[
    (".woff2", "woff2"),
    (".woff", "woff"),
    (".eot", "eot"),
    (".ttf", "truetype"),
    (".otf", "opentype"),
    (".svgz", "svg"),
    (".svg", "svg"),
];

const BASE64_FORMATS: &[(&str, &str)] = &[
    ("image/svg+xml", "svg"),
    ("application/x-font-woff", "woff"),
    ("application/font-woff", "woff"),
    ("application/x-font-woff2", "woff2"),
    ("application/font-woff2", "woff2"),
    ("font/woff2", "woff2"),
    ("application/octet-stream", "truetype"),
    ("application/x-font-ttf", "truetype"),
    ("application/x-font-truetype", "truetype"),
    ("application/x-font-opentype", "opentype"),
    ("application/vnd.ms-fontobject", "eot"),
    ("application/font-sfnt", "sfnt"),
];

pub fn is_base64(src: &str) -> bool {
    src.starts_with("data:")
}

/// Infer the `format()` hint from a file extension or a `data:` MIME type
pub fn get_font_format(src: &str) -> FontResult<&'static str> {
    if is_base64(src) {
        let mime: String = src[5..]
            .chars()
            .take_while(|c| *c != ';' && *c != ',')
            .collect();

        return BASE64_FORMATS
            .iter()
            .find(|(candidate, _)| *candidate == mime)
            .map(|(_, format)| *format)
            .ok_or_else(|| FontError::UnknownFormat {
                src: src.chars().take(40).collect(),
            });
    }

    let lower = src.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");
    FORMATS
        .iter()
        .find(|(extension, _)| path.ends_with(extension))
        .map(|(_, format)| *format)
        .ok_or_else(|| FontError::UnknownFormat {
            src: src.to_string(),
        })
}

pub fn get_font_url(src: &str) -> String {
    if is_base64(src) {
        src.to_string()
    } else {
        format!("'{}'", src)
    }
}

/// Build the `src` descriptor: `local()` entries first, then one
/// `url() format()` entry per file. Files with an unknown format are still
/// listed, just without a format hint.
pub fn generate_font_source(files: &[String], font_locals: &[String]) -> String {
    let local_source = font_locals
        .iter()
        .map(|local| format!("local({})", get_font_url(local)))
        .collect::<Vec<_>>()
        .join(",");

    let url_source = files
        .iter()
        .map(|file| match get_font_format(file) {
            Ok(format) => format!("url({}) format('{}')", get_font_url(file), format),
            Err(err) => {
                warn!(error = %err, "Font file without a known format");
                format!("url({})", get_font_url(file))
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    let delimiter = if !local_source.is_empty() && !url_source.is_empty() {
        ","
    } else {
        ""
    };

    format!("{}{}{}", local_source, delimiter, url_source)
}
