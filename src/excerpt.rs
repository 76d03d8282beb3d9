//! Plain-text teasers for the landing list.
//!
//! The excerpt is the first prose paragraph of a post body, rendered and
//! stripped back to text. Paragraphs are blocks separated by a blank line
//! (`\n\n`); blocks made only of headings are passed over so a post that
//! opens with `# Title` gets its first real sentence as the teaser.

use crate::markdown::MarkdownRenderer;
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_EXCERPT_CHARS: usize = 150;
const ELLIPSIS: &str = "...";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Excerpt of at most [`MAX_EXCERPT_CHARS`] characters; longer text is cut
/// to exactly that length, ending in `...`.
pub fn extract_excerpt(body: &str) -> String {
    let Some(paragraph) = first_paragraph(body) else {
        return String::new();
    };
    let html = MarkdownRenderer::plain().render(paragraph);
    let text = decode_entities(&TAG_RE.replace_all(&html, ""));
    truncate(&text.trim().replace('\n', " "))
}

fn first_paragraph(body: &str) -> Option<&str> {
    let mut blocks = body.split("\n\n").filter(|p| !p.trim().is_empty());
    let first = blocks.next()?;
    if !is_heading_block(first) {
        return Some(first);
    }
    Some(blocks.find(|p| !is_heading_block(p)).unwrap_or(first))
}

fn is_heading_block(block: &str) -> bool {
    block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .all(|l| l.starts_with('#'))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_EXCERPT_CHARS {
        return text.to_string();
    }
    let keep = MAX_EXCERPT_CHARS - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
