//! Ordering scores for rules inside a stylesheet node and for the nodes
//! themselves

use crate::types::StyleType;
use regex::Regex;

/// Pseudo classes that must be applied in this order to cascade correctly
pub const DEFAULT_RULE_ORDER: &[&str] = &[
    "^:link",
    "^:visited",
    "^:hover",
    "^:focus-within",
    "^:focus",
    "^:active",
];

const TYPE_WEIGHT: u32 = 1_000_000;
const MEDIA_WEIGHT: u32 = 1_000;
const MAX_RANK: u32 = MEDIA_WEIGHT - 1;

/// Score of a rule inside its node: 0 for order-insensitive rules, otherwise
/// 1 + the index of the first matching rule-order pattern
pub fn get_rule_score(rule_order: &[Regex], pseudo: &str) -> u32 {
    if rule_order.is_empty() || pseudo.is_empty() {
        return 0;
    }

    rule_order
        .iter()
        .position(|pattern| pattern.is_match(pseudo))
        .map(|index| index as u32 + 1)
        .unwrap_or(0)
}

fn type_score(kind: StyleType) -> u32 {
    match kind {
        StyleType::Font | StyleType::Clear => 0,
        StyleType::Static => 1,
        StyleType::Keyframe => 2,
        StyleType::Rule => 3,
    }
}

/// 0 for no query, 1 + position in the configured order, or after every
/// configured query when unknown
fn query_rank(query: &str, order: &[String]) -> u32 {
    if query.is_empty() {
        return 0;
    }

    let rank = order
        .iter()
        .position(|candidate| candidate == query)
        .unwrap_or(order.len())
        + 1;

    (rank as u32).min(MAX_RANK)
}

/// Score of a stylesheet node. Nodes are kept in ascending score order inside
/// a document: fonts, statics, keyframes, plain rules, then media rules in the
/// configured media order, each followed by its support-query variants.
pub fn calculate_node_score(
    kind: StyleType,
    media: &str,
    support: &str,
    media_query_order: &[String],
    support_query_order: &[String],
) -> u32 {
    type_score(kind) * TYPE_WEIGHT
        + query_rank(media, media_query_order) * MEDIA_WEIGHT
        + query_rank(support, support_query_order)
}
