//! Shared types produced by the content pipeline.
//!
//! A [`Post`] is built once per post directory and never mutated afterwards;
//! a [`Page`] is discovered once per build from the pages directory.

use chrono::NaiveDate;
use std::path::PathBuf;

/// One rendered blog entry, sourced from `posts/<code>/index.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Directory name, used as the URL slug. Unique within a build.
    pub code: String,
    pub title: String,
    /// Always a valid date: malformed or missing input falls back to
    /// [`crate::extract::SENTINEL_DATE`].
    pub date: NaiveDate,
    pub tags: Vec<String>,
    /// Plain-text teaser, at most 150 characters.
    pub excerpt: String,
    /// Rendered body with line numbers, tag badges and rewritten image paths.
    pub content_html: String,
    /// Output path relative to the site root, e.g. `posts/hello.html`.
    pub link_path: PathBuf,
}

impl Post {
    /// Link path with forward slashes, suitable for an `href`.
    pub fn href(&self) -> String {
        self.link_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Source format of a page document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Inserted into the template verbatim.
    Html,
    /// Rendered through the Markdown renderer first.
    Markdown,
}

/// A navigable top-level page (e.g. `about`, `index`), distinct from posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Slug, the file stem (`about` for `about.html`).
    pub name: String,
    /// Source file name inside the pages directory.
    pub filename: String,
    /// Label shown in navigation.
    pub display_name: String,
    pub kind: PageKind,
}

impl Page {
    /// The page named `index` becomes the site root document.
    pub fn is_index(&self) -> bool {
        self.name == "index"
    }

    /// File name of the rendered page in the output directory.
    pub fn output_name(&self) -> String {
        format!("{}.html", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_href_uses_forward_slashes() {
        let post = Post {
            code: "hello".into(),
            title: "Hello".into(),
            date: NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
            tags: vec![],
            excerpt: String::new(),
            content_html: String::new(),
            link_path: PathBuf::from("posts").join("hello.html"),
        };
        assert_eq!(post.href(), "posts/hello.html");
    }

    #[test]
    fn markdown_page_outputs_html() {
        let page = Page {
            name: "about".into(),
            filename: "about.md".into(),
            display_name: "About".into(),
            kind: PageKind::Markdown,
        };
        assert_eq!(page.output_name(), "about.html");
        assert!(!page.is_index());
    }
}
