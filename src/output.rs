//! CLI output formatting for a build.
//!
//! Output is a content inventory: posts newest first with their date and
//! tags, image outcomes indented beneath the post they belong to, then the
//! pages and a one-line summary.
//!
//! ```text
//! Posts
//! 001 Second Post (2021-06-01) [rust, web]
//!     Source: posts/second-post/
//!     diagram.png: compressed
//!     photo.jpg: reused
//! 002 Hello (1997-01-01)
//!     Source: posts/hello/
//!
//! Skipped
//!     posts/draft/ (no index.md)
//!
//! Pages
//! 001 About → about.html
//! 002 Index → index.html
//!
//! Built 2 posts, 2 pages, 3 static files → build/
//! Images: 1 compressed, 1 reused, 0 rejected, 0 failed
//! ```
//!
//! [`format_build_output`] is pure and returns lines for testability;
//! [`print_build_output`] writes them to stdout.

use crate::generate::{BuildReport, PostSummary};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// ```text
/// 001 Hello (2021-03-04) [a, b]
/// ```
fn post_header(index: usize, post: &PostSummary) -> String {
    let mut line = format!(
        "{} {} ({})",
        format_index(index),
        post.title,
        post.date.format("%Y-%m-%d")
    );
    if !post.tags.is_empty() {
        line.push_str(&format!(" [{}]", post.tags.join(", ")));
    }
    line
}

fn post_lines(index: usize, post: &PostSummary) -> Vec<String> {
    let mut lines = vec![
        post_header(index, post),
        format!("{}Source: posts/{}/", indent(1), post.code),
    ];
    let images = &post.images;
    for (names, status) in [
        (&images.compressed, "compressed"),
        (&images.reused, "reused"),
        (&images.rejected, "rejected"),
        (&images.failed, "failed"),
    ] {
        for name in names {
            lines.push(format!("{}{name}: {status}", indent(1)));
        }
    }
    lines
}

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.posts.is_empty() {
        lines.push("Posts".to_string());
        for (i, post) in report.posts.iter().enumerate() {
            lines.extend(post_lines(i + 1, post));
        }
    }

    if !report.skipped.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Skipped".to_string());
        for code in &report.skipped {
            lines.push(format!("{}posts/{code}/ (no index.md)", indent(1)));
        }
    }

    if !report.pages.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Pages".to_string());
        for (i, (title, file)) in report.pages.iter().enumerate() {
            lines.push(format!("{} {title} → {file}", format_index(i + 1)));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Built {}, {}, {} → {}/",
        plural(report.posts.len(), "post"),
        plural(report.pages.len(), "page"),
        plural(report.static_files, "static file"),
        report.output_dir.display()
    ));
    let totals = report.image_totals();
    lines.push(format!(
        "Images: {} compressed, {} reused, {} rejected, {} failed",
        totals.compressed.len(),
        totals.reused.len(),
        totals.rejected.len(),
        totals.failed.len()
    ));

    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}
