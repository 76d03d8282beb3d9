//! Title, tag and date extraction for posts.
//!
//! Titles come from the body, tags from front matter or from bracket tokens
//! in the title, and front matter has the last word:
//!
//! ```text
//! body heading      "# [news][rust] Shipping 1.0"
//!   extract_title → "[news][rust] Shipping 1.0"
//!   resolve_tags  → tags ["news", "rust"], title "Shipping 1.0"
//!                   (unless front matter lists tags, which win)
//!   front matter `title:` replaces the title, applied last
//! ```
//!
//! The heading line itself is rewritten by [`clean_heading`] so the rendered
//! `<h1>` never shows the bracket tokens.

use crate::frontmatter::{FrontMatter, TagSpec};
use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

/// Date used for posts whose front matter has no usable `date`.
pub const SENTINEL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1997, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Front-matter dates are month-day-year.
pub const DATE_FORMAT: &str = "%m-%d-%Y";

const UNTITLED: &str = "Untitled";

/// A level-1 heading: `#`, optional blanks, then text that does not start
/// with another `#`.
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]*([^#\s][^\n]*)$").unwrap());

static TAG_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*((?:\[[^\]]+\]\s*)+)").unwrap());

static TAG_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Working title of a body: first level-1 heading, else first non-blank
/// line, else `"Untitled"`.
pub fn extract_title(body: &str) -> String {
    if let Some(caps) = H1_RE.captures(body) {
        return caps[1].trim().to_string();
    }
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

/// Strip leading `[tag]` tokens from a title.
///
/// `"[A][B] Rest of Title"` → `(["A", "B"], "Rest of Title")`. A title with
/// no leading token comes back unchanged with no tags.
pub fn split_title_tags(title: &str) -> (Vec<String>, String) {
    let Some(prefix) = TAG_PREFIX_RE.captures(title).and_then(|c| c.get(0)) else {
        return (Vec::new(), title.to_string());
    };
    let tags = TAG_TOKEN_RE
        .captures_iter(prefix.as_str())
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    (tags, title[prefix.end()..].trim().to_string())
}

/// Resolve a post's tags and final title.
///
/// Precedence for tags: a front-matter list, then a comma-separated
/// front-matter string, then bracket tokens in `raw_title` (which also
/// cleans the title). When front matter yields no tags the title tokens are
/// tried. A front-matter `title` string replaces the title unconditionally.
pub fn resolve_tags(front_matter: &FrontMatter, raw_title: &str) -> (Vec<String>, String) {
    let from_front_matter = match front_matter.tags() {
        TagSpec::List(tags) => tags,
        TagSpec::Csv(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        TagSpec::None => Vec::new(),
    };

    let (tags, title) = if from_front_matter.is_empty() {
        split_title_tags(raw_title)
    } else {
        (from_front_matter, raw_title.to_string())
    };

    let title = front_matter.title().map(String::from).unwrap_or(title);
    (tags, title)
}

/// Rewrite the first level-1 heading of `body` without its bracket tokens.
///
/// `# [news] My Post` becomes `# My Post`. Everything else is untouched.
pub fn clean_heading(body: &str) -> String {
    let Some(caps) = H1_RE.captures(body) else {
        return body.to_string();
    };
    let (Some(line), Some(text)) = (caps.get(0), caps.get(1)) else {
        return body.to_string();
    };
    let (_, cleaned) = split_title_tags(text.as_str());
    let mut out = String::with_capacity(body.len());
    out.push_str(&body[..line.start()]);
    out.push_str("# ");
    out.push_str(&cleaned);
    out.push_str(&body[line.end()..]);
    out
}

/// Parse a `MM-DD-YYYY` date string.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// The post's date from front matter, or [`SENTINEL_DATE`].
///
/// A missing key is silent; a present but unusable value logs a warning.
pub fn post_date(front_matter: &FrontMatter, code: &str) -> NaiveDate {
    match front_matter.get("date") {
        None | Some(Value::Null) => SENTINEL_DATE,
        Some(Value::String(raw)) => parse_date(raw).unwrap_or_else(|| {
            warn!("Invalid date '{raw}' in {code}, defaulting to {SENTINEL_DATE}");
            SENTINEL_DATE
        }),
        Some(other) => {
            warn!("Invalid date {other:?} in {code}, defaulting to {SENTINEL_DATE}");
            SENTINEL_DATE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter;

    fn fm(text: &str) -> FrontMatter {
        frontmatter::parse(text).unwrap().0
    }

    // =========================================================================
    // extract_title
    // =========================================================================

    #[test]
    fn title_from_first_h1() {
        assert_eq!(extract_title("intro\n# Hello  \n# Second"), "Hello");
    }

    #[test]
    fn title_ignores_deeper_headings() {
        assert_eq!(extract_title("## Sub\n\n# Main"), "Main");
    }

    #[test]
    fn title_falls_back_to_first_non_blank_line() {
        assert_eq!(extract_title("\n\n   first line  \nsecond"), "first line");
    }

    #[test]
    fn title_of_blank_body_is_untitled() {
        assert_eq!(extract_title(""), "Untitled");
        assert_eq!(extract_title("  \n\t\n"), "Untitled");
    }

    #[test]
    fn title_without_space_after_hash() {
        assert_eq!(extract_title("#Tight"), "Tight");
    }

    // =========================================================================
    // split_title_tags
    // =========================================================================

    #[test]
    fn split_multiple_tokens() {
        let (tags, title) = split_title_tags("[A][B] Rest of Title");
        assert_eq!(tags, vec!["A", "B"]);
        assert_eq!(title, "Rest of Title");
    }

    #[test]
    fn split_tokens_with_spaces() {
        let (tags, title) = split_title_tags("[ news ] [python]  My Post");
        assert_eq!(tags, vec!["news", "python"]);
        assert_eq!(title, "My Post");
    }

    #[test]
    fn split_no_tokens() {
        let (tags, title) = split_title_tags("Plain [not a tag]");
        assert!(tags.is_empty());
        assert_eq!(title, "Plain [not a tag]");
    }

    // =========================================================================
    // resolve_tags
    // =========================================================================

    #[test]
    fn csv_tags_are_split_and_trimmed() {
        let meta = fm("---\ntags: ' a, ,b ,'\n---\n");
        let (tags, title) = resolve_tags(&meta, "Hello");
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(title, "Hello");
    }

    #[test]
    fn list_tags_win_over_title_tokens() {
        let meta = fm("---\ntags: [x, y]\n---\n");
        let (tags, title) = resolve_tags(&meta, "[news] Post");
        assert_eq!(tags, vec!["x", "y"]);
        assert_eq!(title, "[news] Post");
    }

    #[test]
    fn title_tokens_used_without_front_matter_tags() {
        let (tags, title) = resolve_tags(&FrontMatter::default(), "[news] My Post");
        assert_eq!(tags, vec!["news"]);
        assert_eq!(title, "My Post");
    }

    #[test]
    fn empty_front_matter_list_falls_back_to_title() {
        let meta = fm("---\ntags: []\n---\n");
        let (tags, _) = resolve_tags(&meta, "[a] T");
        assert_eq!(tags, vec!["a"]);
    }

    #[test]
    fn front_matter_title_overrides_last() {
        let meta = fm("---\ntitle: Override\n---\n");
        let (tags, title) = resolve_tags(&meta, "[a] Cleaned");
        assert_eq!(tags, vec!["a"]);
        assert_eq!(title, "Override");
    }

    // =========================================================================
    // clean_heading
    // =========================================================================

    #[test]
    fn clean_heading_drops_tokens() {
        let body = "intro\n# [news][rust] My Post\n\ntext\n# [keep] Second\n";
        assert_eq!(
            clean_heading(body),
            "intro\n# My Post\n\ntext\n# [keep] Second\n"
        );
    }

    #[test]
    fn clean_heading_normalises_plain_heading() {
        assert_eq!(clean_heading("#Title\nbody"), "# Title\nbody");
    }

    #[test]
    fn clean_heading_without_h1_is_identity() {
        let body = "## Only sub\ntext";
        assert_eq!(clean_heading(body), body);
    }

    // =========================================================================
    // dates
    // =========================================================================

    #[test]
    fn parses_month_day_year() {
        assert_eq!(parse_date("03-04-2021"), NaiveDate::from_ymd_opt(2021, 3, 4));
        assert_eq!(parse_date("2021-03-04"), None);
        assert_eq!(parse_date("13-01-2021"), None);
    }

    #[test]
    fn post_date_defaults_to_sentinel() {
        assert_eq!(post_date(&FrontMatter::default(), "p"), SENTINEL_DATE);
        assert_eq!(post_date(&fm("---\ndate: soon\n---\n"), "p"), SENTINEL_DATE);
        assert_eq!(post_date(&fm("---\ndate: 42\n---\n"), "p"), SENTINEL_DATE);
        assert_eq!(
            post_date(&fm("---\ndate: 12-31-2020\n---\n"), "p"),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()
        );
    }

    #[test]
    fn sentinel_is_first_of_1997() {
        assert_eq!(SENTINEL_DATE.to_string(), "1997-01-01");
    }
}
