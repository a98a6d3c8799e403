use once_cell::sync::Lazy;
use regex::Regex;

const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

static PREFIX_SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z_][a-z0-9_-]*$").unwrap());

/// Map a rule identifier (starting at 1) to a short letter-only class name.
///
/// `1 → a`, `26 → z`, `27 → ab`, `52 → ba`
pub fn generate_unique_class_name(id: u32) -> String {
    debug_assert!(id > 0, "rule identifiers start at 1");

    let mut id = id.max(1);
    let mut chars = Vec::new();
    while id as usize > CHARS.len() {
        chars.push(CHARS[id as usize % CHARS.len()]);
        id /= CHARS.len() as u32;
    }
    chars.push(CHARS[id as usize - 1]);
    chars.reverse();

    chars.into_iter().map(char::from).collect()
}

/// Draw identifiers until the filter accepts the generated name. `None` once
/// the identifiers run out.
pub fn generate_class_name<N, F>(mut next_id: N, filter: F) -> Option<String>
where
    N: FnMut() -> Option<u32>,
    F: Fn(&str) -> bool,
{
    loop {
        let class_name = generate_unique_class_name(next_id()?);
        if filter(&class_name) {
            return Some(class_name);
        }
    }
}

/// Default class-name filter: names containing `ad` are dropped by ad blockers
pub fn is_safe_class_name(class_name: &str) -> bool {
    !class_name.contains("ad")
}

pub fn generate_animation_name(id: u32) -> String {
    format!("k{}", id)
}

pub fn is_valid_selector_prefix(prefix: &str) -> bool {
    prefix.is_empty() || PREFIX_SYNTAX.is_match(prefix)
}
