//! Site build orchestration.
//!
//! One synchronous pass from the site root to the output directory:
//!
//! ```text
//! 1. Prepare     build/, build/posts/, build/posts/images/, read the template
//! 2. Pages       discover pages/ → navigation bar
//! 3. Posts       for each posts/<code>/ in name order:
//!                  index.md ─► assemble_post
//!                  images   ─► process_post_images (shared ImageRecord)
//! 4. Sort        posts by date, newest first (ties keep directory order)
//! 5. Write       build/posts/<code>.html, build/<page>.html, build/index.html
//! 6. Assets      static/ → build/, highlight.css
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! build/
//! ├── index.html                 # pages/index.* + landing list
//! ├── about.html                 # Other pages
//! ├── highlight.css              # Code colours for the configured theme
//! ├── style.css                  # Copied from static/
//! └── posts/
//!     ├── hello-world.html
//!     └── images/
//!         └── hello-world/
//!             └── diagram.png    # AVIF payload, original file name
//! ```
//!
//! Builds are deterministic: every listing is sorted, and the only state
//! carried between posts is the [`ImageRecord`].

use crate::annotate::annotate;
use crate::assemble::{
    assemble_post, landing_list, nav_links, normalize_newlines, render_template,
};
use crate::config::{SitePaths, SiteConfig};
use crate::frontmatter::FrontMatterError;
use crate::highlight::{HighlightError, SyntaxHighlighter};
use crate::imaging::{ImageBackend, ImageRecord, ImageStats, process_post_images};
use crate::markdown::MarkdownRenderer;
use crate::scan::{self, ScanError};
use crate::types::{Page, PageKind, Post};
use chrono::NaiveDate;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HIGHLIGHT_CSS: &str = "highlight.css";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read template {path}: {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: FrontMatterError,
    },
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

/// One published post as reported after a build.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub code: String,
    pub title: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub images: ImageStats,
}

/// What a build produced, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Newest first, matching the landing list.
    pub posts: Vec<PostSummary>,
    /// Post directories left out because they have no `index.md`.
    pub skipped: Vec<String>,
    /// Output file name per written page, in discovery order.
    pub pages: Vec<(String, String)>,
    pub static_files: usize,
}

impl BuildReport {
    /// Image outcomes summed over every post.
    pub fn image_totals(&self) -> ImageStats {
        let mut total = ImageStats::default();
        for post in &self.posts {
            total.merge(post.images.clone());
        }
        total
    }
}

/// Build the whole site under `root` into the configured output directory.
pub fn build_site(
    config: &SiteConfig,
    root: &Path,
    backend: &impl ImageBackend,
) -> Result<BuildReport, BuildError> {
    let paths = config.paths.resolve(root);

    let highlighter = SyntaxHighlighter::new(&config.markdown.theme);
    // Fails early on an unknown theme, before any output is written.
    let css = highlighter.css()?;
    let renderer = MarkdownRenderer::new(highlighter);

    fs::create_dir_all(paths.output_images())?;
    let template = fs::read_to_string(&paths.template).map_err(|source| BuildError::Template {
        path: paths.template.clone(),
        source,
    })?;

    let pages = scan::discover_pages(&paths.pages, &config.pages.display_names)?;
    let nav = nav_links(&pages);

    let mut report = BuildReport {
        output_dir: paths.output.clone(),
        ..BuildReport::default()
    };
    let mut record = ImageRecord::new();
    let mut built: Vec<(Post, ImageStats)> = Vec::new();

    for post_dir in scan::discover_posts(&paths.posts)? {
        let index_md = post_dir.index_md();
        if !index_md.is_file() {
            warn!("Skipping {}: no index.md", post_dir.path.display());
            report.skipped.push(post_dir.code);
            continue;
        }
        let source = read(&index_md)?;
        let post = assemble_post(&post_dir.code, &source, &renderer).map_err(|source| {
            BuildError::FrontMatter {
                path: index_md.clone(),
                source,
            }
        })?;
        let images = process_post_images(
            backend,
            &post_dir.path,
            &paths.output_images(),
            &post_dir.code,
            config.images.compress_settings(),
            &mut record,
        );
        built.push((post, images));
    }

    // Stable: posts sharing a date keep directory order.
    built.sort_by(|(a, _), (b, _)| b.date.cmp(&a.date));

    for (post, _) in &built {
        let out = paths.output.join(&post.link_path);
        fs::write(&out, render_template(&template, &post.content_html, &nav))?;
        info!("Rendered {}", out.display());
    }

    let posts: Vec<Post> = built.iter().map(|(post, _)| post.clone()).collect();
    for page in &pages {
        let written = write_page(page, &paths, &template, &nav, &renderer, &posts)?;
        report.pages.push((page.display_name.clone(), written));
    }

    report.static_files = scan::copy_static(&paths.static_dir, &paths.output)?;
    fs::write(paths.output.join(HIGHLIGHT_CSS), css)?;

    report.posts = built
        .into_iter()
        .map(|(post, images)| PostSummary {
            code: post.code,
            title: post.title,
            date: post.date,
            tags: post.tags,
            images,
        })
        .collect();
    info!(
        "Built {} posts and {} pages into {}",
        report.posts.len(),
        report.pages.len(),
        paths.output.display()
    );
    Ok(report)
}

fn read(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Render one page into the template. The `index` page additionally gets
/// the landing list. Returns the output file name.
fn write_page(
    page: &Page,
    paths: &SitePaths,
    template: &str,
    nav: &str,
    renderer: &MarkdownRenderer,
    posts: &[Post],
) -> Result<String, BuildError> {
    let source = read(&paths.pages.join(&page.filename))?;
    let mut content = match page.kind {
        PageKind::Html => source,
        PageKind::Markdown => annotate(&renderer.render(&normalize_newlines(&source))),
    };
    if page.is_index() {
        content.push_str(&landing_list(posts));
    }

    let name = page.output_name();
    let out = paths.output.join(&name);
    fs::write(&out, render_template(template, &content, nav))?;
    info!("Rendered {}", out.display());
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<html><nav>{{ nav_links }}</nav><main>{{ content }}</main></html>";

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Minimal site: template, one page, no posts.
    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "static/template.html", TEMPLATE);
        write(tmp.path(), "pages/index.html", "<p>Welcome</p>");
        tmp
    }

    fn build(root: &Path) -> BuildReport {
        build_site(&SiteConfig::default(), root, &MockBackend::new()).unwrap()
    }

    fn output(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join("build").join(rel)).unwrap()
    }

    // =========================================================================
    // Output layout
    // =========================================================================

    #[test]
    fn creates_output_directories() {
        let tmp = site();
        build(tmp.path());
        assert!(tmp.path().join("build/posts/images").is_dir());
        assert!(tmp.path().join("build/highlight.css").is_file());
    }

    #[test]
    fn missing_template_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = build_site(&SiteConfig::default(), tmp.path(), &MockBackend::new()).unwrap_err();
        assert!(matches!(err, BuildError::Template { .. }));
        assert!(err.to_string().contains("template.html"));
    }

    #[test]
    fn unknown_theme_is_fatal() {
        let tmp = site();
        let mut config = SiteConfig::default();
        config.markdown.theme = "No Such Theme".into();
        let err = build_site(&config, tmp.path(), &MockBackend::new()).unwrap_err();
        assert!(matches!(err, BuildError::Highlight(_)));
    }

    #[test]
    fn post_is_written_under_posts() {
        let tmp = site();
        write(tmp.path(), "posts/hello/index.md", "# Hello\n\nBody text.\n");

        let report = build(tmp.path());

        let html = output(tmp.path(), "posts/hello.html");
        assert!(html.starts_with("<html><nav>"));
        assert!(html.contains("Body text."));
        assert!(html.contains(r#"<a href="/index.html">Index</a>"#));
        assert_eq!(report.posts[0].title, "Hello");
    }

    #[test]
    fn directory_without_index_md_is_skipped() {
        let tmp = site();
        write(tmp.path(), "posts/draft/notes.txt", "todo");
        write(tmp.path(), "posts/real/index.md", "# Real");

        let report = build(tmp.path());

        assert_eq!(report.skipped, vec!["draft"]);
        assert_eq!(report.posts.len(), 1);
        assert!(!tmp.path().join("build/posts/draft.html").exists());
    }

    #[test]
    fn malformed_front_matter_aborts_with_path() {
        let tmp = site();
        write(tmp.path(), "posts/bad/index.md", "---\ntitle: [unclosed\n---\nBody");

        let err = build_site(&SiteConfig::default(), tmp.path(), &MockBackend::new()).unwrap_err();
        match err {
            BuildError::FrontMatter { path, .. } => {
                assert!(path.ends_with("bad/index.md"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // =========================================================================
    // Pages and landing list
    // =========================================================================

    #[test]
    fn only_index_gets_landing_list() {
        let tmp = site();
        write(tmp.path(), "pages/about.html", "<p>About</p>");
        write(tmp.path(), "posts/one/index.md", "# One\n\nFirst post.");

        let report = build(tmp.path());

        let index = output(tmp.path(), "index.html");
        let about = output(tmp.path(), "about.html");
        assert!(index.contains("<p>Welcome</p>"));
        assert!(index.contains("landing-list"));
        assert!(index.contains(r#"href="posts/one.html""#));
        assert!(!about.contains("landing-list"));
        assert_eq!(
            report.pages,
            vec![
                ("About".to_string(), "about.html".to_string()),
                ("Index".to_string(), "index.html".to_string()),
            ]
        );
    }

    #[test]
    fn markdown_page_is_rendered() {
        let tmp = site();
        write(tmp.path(), "pages/now.md", "# Now\n\nReading *books*.");

        build(tmp.path());

        let now = output(tmp.path(), "now.html");
        assert!(now.contains("<em>books</em>"));
        assert!(now.contains(r#"<a href="/now.html">Now</a>"#));
    }

    #[test]
    fn markdown_page_code_is_numbered() {
        let tmp = site();
        write(tmp.path(), "pages/uses.md", "# Uses\r\n\r\n```\r\nvim\r\ngit\r\n```\r\n");

        build(tmp.path());

        let uses = output(tmp.path(), "uses.html");
        assert!(uses.contains(r#"<span class="ln">1</span>vim"#));
        assert!(uses.contains(r#"<span class="ln">2</span>git"#));
    }

    #[test]
    fn landing_list_is_newest_first_with_stable_ties() {
        let tmp = site();
        write(tmp.path(), "posts/a/index.md", "---\ndate: 01-01-2020\n---\n# A");
        write(tmp.path(), "posts/b/index.md", "---\ndate: 06-01-2021\n---\n# B");
        write(tmp.path(), "posts/c/index.md", "---\ndate: 01-01-2020\n---\n# C");

        let report = build(tmp.path());

        let codes: Vec<_> = report.posts.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["b", "a", "c"]);
        let index = output(tmp.path(), "index.html");
        let pos = |code: &str| index.find(&format!("posts/{code}.html")).unwrap();
        assert!(pos("b") < pos("a"));
        assert!(pos("a") < pos("c"));
    }

    // =========================================================================
    // Images and static assets
    // =========================================================================

    #[test]
    fn post_images_are_published_and_referenced() {
        let tmp = site();
        write(tmp.path(), "posts/p/index.md", "# P\n\n![d](diagram.png)");
        write(tmp.path(), "posts/p/diagram.png", "png");

        let report = build(tmp.path());

        assert!(tmp.path().join("build/posts/images/p/diagram.png").exists());
        assert!(output(tmp.path(), "posts/p.html").contains(r#"src="/posts/images/p/diagram.png""#));
        assert_eq!(report.image_totals().compressed, vec!["diagram.png"]);
    }

    #[test]
    fn shared_image_name_is_compressed_once() {
        let tmp = site();
        write(tmp.path(), "posts/a/index.md", "# A");
        write(tmp.path(), "posts/a/photo.jpg", "x");
        write(tmp.path(), "posts/b/index.md", "# B");
        write(tmp.path(), "posts/b/photo.jpg", "x");

        let backend = MockBackend::new();
        build_site(&SiteConfig::default(), tmp.path(), &backend).unwrap();

        assert_eq!(backend.compressed_names(), vec!["photo.jpg"]);
        assert!(tmp.path().join("build/posts/images/b/photo.jpg").exists());
    }

    #[test]
    fn static_files_are_copied_verbatim() {
        let tmp = site();
        write(tmp.path(), "static/style.css", "body{}");

        let report = build(tmp.path());

        assert_eq!(output(tmp.path(), "style.css"), "body{}");
        assert_eq!(output(tmp.path(), "template.html"), TEMPLATE);
        assert_eq!(report.static_files, 2);
    }

    #[test]
    fn configured_output_directory() {
        let tmp = site();
        let mut config = SiteConfig::default();
        config.paths.output = "public".into();

        let report = build_site(&config, tmp.path(), &MockBackend::new()).unwrap();

        assert!(tmp.path().join("public/index.html").exists());
        assert_eq!(report.output_dir, tmp.path().join("public"));
    }

    #[test]
    fn rebuild_overwrites_previous_output() {
        let tmp = site();
        write(tmp.path(), "posts/p/index.md", "# P\n\nFirst.");
        build(tmp.path());
        write(tmp.path(), "posts/p/index.md", "# P\n\nSecond.");
        build(tmp.path());

        let html = output(tmp.path(), "posts/p.html");
        assert!(html.contains("Second."));
        assert!(!html.contains("First."));
    }
}
