//! Parsed rule list of a style node, the subset of the CSSOM the sinks need

use crate::error::{SheetError, SheetResult};

/// A top-level rule of a sheet (`.a{color:red}`, `@supports (x){.a{...}}`)
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRule {
    css_text: String,
    /// Ordering score assigned when the rule was inserted or rehydrated
    pub score: u32,
}

impl SheetRule {
    pub fn new(css_text: impl Into<String>) -> Self {
        Self {
            css_text: css_text.into(),
            score: 0,
        }
    }

    pub fn css_text(&self) -> &str {
        &self.css_text
    }

    /// Condition of a grouping rule: `(display:grid)` for
    /// `@supports (display:grid){...}`
    pub fn condition_text(&self) -> Option<&str> {
        let rest = self.css_text.strip_prefix('@')?;
        let prelude = &rest[..rest.find('{')?];
        let condition = prelude.split_once(char::is_whitespace)?.1.trim();
        Some(condition)
    }

    /// Selector of the rule, or of the first nested rule of a grouping rule
    pub fn selector_text(&self) -> &str {
        let css = if self.condition_text().is_some() {
            match self.css_text.find('{') {
                Some(open) => &self.css_text[open + 1..],
                None => return "",
            }
        } else {
            self.css_text.as_str()
        };

        match css.find('{') {
            Some(open) => css[..open].trim(),
            None => "",
        }
    }
}

/// Rules of a style node in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSheet {
    rules: Vec<SheetRule>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the top-level rules of a CSS text. Unbalanced trailing input is
    /// dropped like a browser would.
    pub fn parse(css: &str) -> Self {
        Self {
            rules: split_rules(css).into_iter().map(SheetRule::new).collect(),
        }
    }

    pub fn rules(&self) -> &[SheetRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&SheetRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Insert a single rule at `index` (`0..=len`)
    pub fn insert_rule(&mut self, css: &str, index: usize) -> SheetResult<usize> {
        if index > self.rules.len() {
            return Err(SheetError::IndexOutOfRange {
                index,
                len: self.rules.len(),
            });
        }

        let mut parsed = split_rules(css);
        if parsed.len() != 1 {
            return Err(SheetError::InvalidRule {
                css: css.to_string(),
            });
        }

        self.rules.insert(index, SheetRule::new(parsed.remove(0)));
        Ok(index)
    }

    pub fn set_score(&mut self, index: usize, score: u32) {
        if let Some(rule) = self.rules.get_mut(index) {
            rule.score = score;
        }
    }

    pub fn css_text(&self) -> String {
        self.rules.iter().map(|rule| rule.css_text.as_str()).collect()
    }
}

/// Split CSS text into balanced top-level rules
pub fn split_rules(css: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (offset, ch) in css.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    // Stray closing brace, skip past it
                    start = offset + 1;
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    let rule = css[start..=offset].trim();
                    if !rule.is_empty() {
                        rules.push(rule.to_string());
                    }
                    start = offset + 1;
                }
            }
            _ => {}
        }
    }

    rules
}
