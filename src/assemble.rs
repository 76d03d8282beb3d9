//! Turning parsed documents into finished HTML.
//!
//! ## Post pipeline
//!
//! ```text
//! index.md ─► frontmatter::parse ─► extract (title, tags, date)
//!          ─► clean_heading ─┬─► excerpt
//!                            └─► render ─► annotate ─► inject_tags ─► rewrite_image_sources
//! ```
//!
//! ## Site chrome
//!
//! Pages are merged into the site template by literal substitution of
//! `{{ content }}` and `{{ nav_links }}`. There is no template language:
//! every occurrence is replaced, nothing is escaped, and a template without a
//! placeholder simply never shows that slot.

use crate::annotate::annotate;
use crate::excerpt::extract_excerpt;
use crate::extract::{clean_heading, extract_title, post_date, resolve_tags};
use crate::frontmatter::{self, FrontMatterError};
use crate::markdown::MarkdownRenderer;
use crate::types::{Page, Post};
use maud::{Markup, html};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const CONTENT_PLACEHOLDER: &str = "{{ content }}";
pub const NAV_PLACEHOLDER: &str = "{{ nav_links }}";

/// URL prefix under which post images are published.
pub const IMAGES_URL_PREFIX: &str = "/posts/images";

const LOCAL_EXEMPT_PREFIXES: [&str; 4] = ["/", "http://", "https://", "data:"];

static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\s)src=(?:"([^"']+)"|'([^"']+)')"#).unwrap()
});

// ============================================================================
// Posts
// ============================================================================

/// Fold Windows line endings so paragraph breaks are always `\n\n`.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Run the full per-post pipeline over the text of `posts/<code>/index.md`.
pub fn assemble_post(
    code: &str,
    source: &str,
    renderer: &MarkdownRenderer,
) -> Result<Post, FrontMatterError> {
    let source = normalize_newlines(source);
    let (front_matter, body) = frontmatter::parse(&source)?;

    let raw_title = extract_title(&body);
    let (tags, title) = resolve_tags(&front_matter, &raw_title);
    let date = post_date(&front_matter, code);

    let body = clean_heading(&body);
    let excerpt = extract_excerpt(&body);

    let html = annotate(&renderer.render(&body));
    let html = inject_tags(&html, &tags);
    let content_html = rewrite_image_sources(&html, code);

    Ok(Post {
        code: code.to_string(),
        title,
        date,
        tags,
        excerpt,
        content_html,
        link_path: PathBuf::from("posts").join(format!("{code}.html")),
    })
}

fn tag_badges(tags: &[String]) -> Markup {
    html! {
        div.post-meta {
            div.tags {
                @for tag in tags {
                    span.tag { (tag) }
                }
            }
        }
    }
}

/// Insert tag badges right after the first `</h1>`, or at the very start
/// when there is no level-1 heading. No tags, no change.
pub fn inject_tags(html: &str, tags: &[String]) -> String {
    if tags.is_empty() {
        return html.to_string();
    }
    let badges = tag_badges(tags).into_string();
    match html.find("</h1>") {
        Some(pos) => {
            let split = pos + "</h1>".len();
            format!("{}{badges}{}", &html[..split], &html[split..])
        }
        None => badges + html,
    }
}

/// Point relative image sources at the published copy:
/// `src="diagram.png"` → `src="/posts/images/<code>/diagram.png"`.
///
/// Absolute paths, `http(s)://` URLs and `data:` URIs are left as they are.
pub fn rewrite_image_sources(html: &str, post_code: &str) -> String {
    IMG_SRC_RE
        .replace_all(html, |caps: &Captures| {
            let (src, quote) = match (caps.get(2), caps.get(3)) {
                (Some(src), _) => (src.as_str(), '"'),
                (None, Some(src)) => (src.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };
            if LOCAL_EXEMPT_PREFIXES.iter().any(|p| src.starts_with(p)) {
                return caps[0].to_string();
            }
            let filename = src.rsplit('/').next().unwrap_or(src);
            format!(
                "{}src={quote}{IMAGES_URL_PREFIX}/{post_code}/{filename}{quote}",
                &caps[1]
            )
        })
        .into_owned()
}

// ============================================================================
// Site chrome
// ============================================================================

/// Substitute the content and navigation placeholders, in that order.
pub fn render_template(template: &str, content: &str, nav_links: &str) -> String {
    template
        .replace(CONTENT_PLACEHOLDER, content)
        .replace(NAV_PLACEHOLDER, nav_links)
}

/// Navigation bar: `Home`, then one link per page in discovery order.
pub fn nav_links(pages: &[Page]) -> String {
    let mut out = html! { a href="/" { "Home" } }.into_string();
    out.push('\n');
    for page in pages {
        let href = format!("/{}", page.output_name());
        out.push_str(&html! { a href=(href) { (page.display_name) } }.into_string());
        out.push('\n');
    }
    out
}

/// The post index appended to the home page. Empty for a site with no
/// posts.
pub fn landing_list(posts: &[Post]) -> String {
    if posts.is_empty() {
        return String::new();
    }
    let markup = html! {
        div.landing-list {
            @for post in posts {
                div.landing-item {
                    a.landing-title href=(post.href()) { (post.title) }
                    div.post-meta {
                        time datetime=(post.date.format("%Y-%m-%d").to_string()) {
                            (post.date.format("%b %d, %Y").to_string())
                        }
                    }
                    @if !post.excerpt.is_empty() {
                        p.excerpt { (post.excerpt) }
                    }
                }
            }
        }
    };
    markup.into_string()
}
