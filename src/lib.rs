//! # Blogsmith
//!
//! A small static site generator for a personal Markdown blog. The
//! filesystem is the data source: every directory under `posts/` is a post,
//! every file under `pages/` is a page, and one HTML template wraps them all.
//!
//! # Pipeline
//!
//! ```text
//! posts/<code>/index.md ─► front matter ─► title, tags, date ─► excerpt
//!                                       └► Markdown ─► line numbers ─► tag badges ─► image URLs
//! posts/<code>/*.png    ─► validate ─► bound to 720px ─► AVIF ─► build/posts/images/<code>/
//! pages/*.html|*.md     ─► template + nav ─► build/<page>.html (index gets the post list)
//! static/               ─► build/
//! ```
//!
//! A build is a single synchronous pass, deterministic for a given input
//! tree. `--dev` adds a file watcher and a live-reload server on top.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits the optional YAML block off a Markdown document |
//! | [`extract`] | Title, `[tag]` prefixes and the post date |
//! | [`excerpt`] | Plain-text teaser of at most 150 characters |
//! | [`markdown`] | pulldown-cmark rendering with heading ids and code fences |
//! | [`highlight`] | syntect class-based highlighting and `highlight.css` |
//! | [`annotate`] | Line numbers for every rendered code block |
//! | [`assemble`] | Post pipeline, tag badges, image URLs, template and nav |
//! | [`imaging`] | Image validation and AVIF compression behind [`imaging::ImageBackend`] |
//! | [`scan`] | Discovery of posts, pages and static files |
//! | [`generate`] | [`generate::build_site`], the build orchestrator |
//! | [`config`] | `site.toml` loading, merging and validation |
//! | [`output`] | CLI summary of a build |
//! | [`livereload`], [`serve`], [`watch`] | Dev server |
//! | [`types`] | `Post` and `Page` |
//! | [`naming`] | Page display names and heading slugs |
//!
//! # Design Decisions
//!
//! ## Literal Templating
//!
//! The site template is plain HTML with two placeholders, `{{ content }}`
//! and `{{ nav_links }}`, replaced by substring substitution. Fragments the
//! generator produces itself (tag badges, the landing list, code blocks) are
//! written with [Maud](https://maud.lambda.xyz/) so interpolated text is
//! always escaped.
//!
//! ## One Compression Per Image Name
//!
//! Images are keyed by file name across the whole build. The first post to
//! publish `photo.jpg` compresses it and later posts receive a copy, so a
//! shared screenshot is encoded once no matter how many posts use it.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resizing and AVIF encoding all come from the `image`
//! crate, so the binary has no system dependencies.

pub mod annotate;
pub mod assemble;
pub mod config;
pub mod excerpt;
pub mod extract;
pub mod frontmatter;
pub mod generate;
pub mod highlight;
pub mod imaging;
pub mod livereload;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod scan;
pub mod serve;
pub mod types;
pub mod watch;
