//! Display-name normalization.
//!
//! Every entity recomputes its `lower` lookup key from its normalized name
//! right before it is persisted, so exact and prefix lookups on `lower` are
//! case-insensitive and whitespace-insensitive.

/// Trims and collapses runs of whitespace into single spaces.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `"  coffee BEANS "` -> `"Coffee beans"`.
pub fn sentence_case(input: &str) -> String {
    capitalize(&collapse_whitespace(input))
}

/// `"  ada   LOVELACE"` -> `"Ada Lovelace"`.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `" admin  role "` -> `"ADMIN ROLE"`.
pub fn upper_case(input: &str) -> String {
    collapse_whitespace(input).to_uppercase()
}

/// Case-folded, whitespace-normalized key used for `lower` fields and for
/// lowering user-supplied search terms the same way.
pub fn lookup_key(input: &str) -> String {
    collapse_whitespace(input).to_lowercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}
