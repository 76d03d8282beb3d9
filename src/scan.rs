//! Filesystem discovery for posts, pages and static assets.
//!
//! ## Directory Structure
//!
//! ```text
//! site/
//! ├── site.toml                 # Optional configuration
//! ├── posts/
//! │   ├── hello-world/          # Post code = directory name
//! │   │   ├── index.md
//! │   │   └── diagram.png       # Published to posts/images/hello-world/
//! │   └── second-post/
//! │       └── index.md
//! ├── pages/
//! │   ├── index.html            # Home page, gets the landing list
//! │   ├── about.html            # Inserted into the template verbatim
//! │   └── now.md                # Rendered through Markdown first
//! └── static/
//!     ├── template.html         # {{ content }} / {{ nav_links }}
//!     └── style.css             # Copied to the output root
//! ```
//!
//! Every listing is sorted by name so builds are reproducible. Hidden
//! entries (leading `.`) are ignored.

use crate::naming::display_name;
use crate::types::{Page, PageKind};
use log::warn;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// A post source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDir {
    /// Directory name, used as the post code.
    pub code: String,
    pub path: PathBuf,
}

impl PostDir {
    pub fn index_md(&self) -> PathBuf {
        self.path.join("index.md")
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Sorted, non-hidden entries of `dir` as (name, path). A missing directory
/// is empty with a warning.
fn sorted_entries(dir: &Path, what: &str) -> Result<Vec<(String, PathBuf)>, ScanError> {
    if !dir.is_dir() {
        warn!("No {what} directory at {}", dir.display());
        return Ok(Vec::new());
    }
    let mut entries: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            (!is_hidden(&name)).then(|| (name, e.path()))
        })
        .collect();
    entries.sort();
    Ok(entries)
}

/// Every sub-directory of `posts_dir`, sorted by name. Whether it actually
/// holds an `index.md` is checked at build time.
pub fn discover_posts(posts_dir: &Path) -> Result<Vec<PostDir>, ScanError> {
    Ok(sorted_entries(posts_dir, "posts")?
        .into_iter()
        .filter(|(_, path)| path.is_dir())
        .map(|(code, path)| PostDir { code, path })
        .collect())
}

fn page_kind(path: &Path) -> Option<PageKind> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("html") {
        Some(PageKind::Html)
    } else if ext.eq_ignore_ascii_case("md") {
        Some(PageKind::Markdown)
    } else {
        None
    }
}

/// Every `.html` and `.md` file in `pages_dir`, sorted by file name.
///
/// When both `about.html` and `about.md` exist the first in sort order wins
/// and the other is skipped with a warning, so each page name maps to one
/// output file.
pub fn discover_pages(
    pages_dir: &Path,
    display_names: &BTreeMap<String, String>,
) -> Result<Vec<Page>, ScanError> {
    let mut pages: Vec<Page> = Vec::new();
    for (filename, path) in sorted_entries(pages_dir, "pages")? {
        if !path.is_file() {
            continue;
        }
        let Some(kind) = page_kind(&path) else {
            continue;
        };
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };
        if pages.iter().any(|p| p.name == name) {
            warn!("Skipping {filename}: page '{name}' already defined");
            continue;
        }
        pages.push(Page {
            display_name: display_name(&name, display_names),
            name,
            filename,
            kind,
        });
    }
    Ok(pages)
}

/// Recursively copy `static_dir` into `output_dir`, overwriting existing
/// files. Returns the number of files copied.
pub fn copy_static(static_dir: &Path, output_dir: &Path) -> Result<usize, ScanError> {
    if !static_dir.is_dir() {
        warn!("No static directory at {}", static_dir.display());
        return Ok(0);
    }

    let mut copied = 0;
    let walker = WalkDir::new(static_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(is_hidden));
    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: static_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(static_dir) else {
            continue;
        };
        let dest = output_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        copied += 1;
    }
    Ok(copied)
}
