//! Server rendering: the cache as a list of sheets, as `<style>` markup or as
//! plain CSS

use crate::connection::{MEDIA_ATTRIBUTE, REHYDRATION_ATTRIBUTE, SUPPORT_ATTRIBUTE, TYPE_ATTRIBUTE};
use crate::markup::style_tag_markup;
use fela::Renderer;
use fela_utils::{
    calculate_node_score, generate_css_media_rule, generate_css_rule, generate_css_support_rule,
    get_rule_score, Change, StyleType,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// CSS of one style node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(rename = "type")]
    pub kind: StyleType,
    pub css: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub media: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub support: String,
    /// Rule identifier reached on the server
    pub rehydration: u32,
}

/// Rules sharing a media and support context, with their rule scores
struct RuleCluster {
    media: String,
    support: String,
    rules: Vec<(u32, String)>,
}

/// Cluster the cache into sheets, one per style node the DOM sink would
/// create, in the order those nodes appear in a document
#[instrument(skip_all)]
pub fn render_to_sheet_list(renderer: &Renderer) -> Vec<Sheet> {
    let settings = renderer.settings();
    let rehydration = renderer.unique_rule_identifier();

    let mut font_faces = String::new();
    let mut statics = String::new();
    let mut keyframes = String::new();
    let mut clusters: Vec<RuleCluster> = Vec::new();

    for change in renderer.cache().changes() {
        match change {
            Change::Font { font_face, .. } => font_faces.push_str(font_face),
            Change::Static { css, selector } => match selector {
                Some(selector) => statics.push_str(&generate_css_rule(selector, css)),
                None => statics.push_str(css),
            },
            Change::Keyframe { keyframe, .. } => keyframes.push_str(keyframe),
            Change::Rule {
                selector,
                declaration,
                pseudo,
                media,
                support,
                ..
            } => {
                let css_rule = generate_css_rule(selector, declaration);
                let css_rule = if support.is_empty() {
                    css_rule
                } else {
                    generate_css_support_rule(support, &css_rule)
                };
                let score = get_rule_score(&settings.rule_order, pseudo);

                match clusters
                    .iter_mut()
                    .find(|cluster| cluster.media == *media && cluster.support == *support)
                {
                    Some(cluster) => cluster.rules.push((score, css_rule)),
                    None => clusters.push(RuleCluster {
                        media: media.clone(),
                        support: support.clone(),
                        rules: vec![(score, css_rule)],
                    }),
                }
            }
            Change::Clear => {}
        }
    }

    let mut sheets: Vec<Sheet> = [
        (StyleType::Font, font_faces),
        (StyleType::Static, statics),
        (StyleType::Keyframe, keyframes),
    ]
    .into_iter()
    .filter(|(_, css)| !css.is_empty())
    .map(|(kind, css)| Sheet {
        kind,
        css,
        media: String::new(),
        support: String::new(),
        rehydration,
    })
    .collect();

    let mut rule_sheets: Vec<(u32, Sheet)> = clusters
        .into_iter()
        .map(|mut cluster| {
            // stable, so order-insensitive rules keep render order
            cluster.rules.sort_by_key(|(score, _)| *score);
            let score = calculate_node_score(
                StyleType::Rule,
                &cluster.media,
                &cluster.support,
                &settings.media_query_order,
                &settings.support_query_order,
            );
            let sheet = Sheet {
                kind: StyleType::Rule,
                css: cluster.rules.into_iter().map(|(_, css)| css).collect(),
                media: cluster.media,
                support: cluster.support,
                rehydration,
            };
            (score, sheet)
        })
        .collect();
    rule_sheets.sort_by_key(|(score, _)| *score);

    sheets.extend(rule_sheets.into_iter().map(|(_, sheet)| sheet));
    sheets
}

/// Serialize the sheet list into `<style>` tags carrying the rehydration
/// markers
pub fn render_to_markup(renderer: &Renderer) -> String {
    let node_attributes = &renderer.settings().style_node_attributes;

    render_to_sheet_list(renderer)
        .iter()
        .map(|sheet| {
            let rehydration = sheet.rehydration.to_string();
            let mut attributes = vec![
                (REHYDRATION_ATTRIBUTE, rehydration.as_str()),
                (TYPE_ATTRIBUTE, sheet.kind.as_str()),
            ];
            if !sheet.support.is_empty() {
                attributes.push((SUPPORT_ATTRIBUTE, sheet.support.as_str()));
            }
            if !sheet.media.is_empty() {
                attributes.push((MEDIA_ATTRIBUTE, sheet.media.as_str()));
            }
            for (name, value) in node_attributes {
                attributes.push((name.as_str(), value.as_str()));
            }

            style_tag_markup(&attributes, &sheet.css)
        })
        .collect()
}

/// Everything rendered so far as a single CSS string, media rules wrapped in
/// `@media` blocks
pub fn render_to_string(renderer: &Renderer) -> String {
    render_to_sheet_list(renderer)
        .into_iter()
        .map(|sheet| {
            if sheet.media.is_empty() {
                sheet.css
            } else {
                generate_css_media_rule(&sheet.media, &sheet.css)
            }
        })
        .collect()
}
