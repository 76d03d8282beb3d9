//! Name derivation helpers shared by pages and headings.
//!
//! ## Page display names
//!
//! A page's navigation label is its file stem with the first letter
//! upper-cased and the rest lower-cased (`about` → "About",
//! `ABOUT-me` → "About-me"), unless `[pages.display_names]` in `site.toml`
//! maps the slug to an explicit label.
//!
//! ## Heading anchors
//!
//! Headings get an `id` derived from their text: lower-cased, every run of
//! non-alphanumeric characters collapsed to a single dash, leading and
//! trailing dashes stripped (`"Hello, World!"` → `hello-world`).

use std::collections::BTreeMap;

const MAX_SLUG_LEN: usize = 80;

/// Capitalize a page slug the way it is shown in navigation.
pub fn capitalize(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Resolve the display name for a page slug: explicit mapping first,
/// capitalized slug otherwise.
pub fn display_name(slug: &str, overrides: &BTreeMap<String, String>) -> String {
    overrides
        .get(slug)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| capitalize(slug))
}

/// Turn heading text into an anchor id.
///
/// Truncates to `MAX_SLUG_LEN` characters, breaking at the last dash before
/// the limit. Returns `"section"` when nothing usable is left.
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_dash = true;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    let trimmed = slug.trim_end_matches('-');

    if trimmed.is_empty() {
        return "section".to_string();
    }
    if trimmed.chars().count() <= MAX_SLUG_LEN {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    match truncated.rfind('-') {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated,
    }
}
