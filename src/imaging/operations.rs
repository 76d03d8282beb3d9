//! High-level image operations.
//!
//! These functions decide which files of a post directory are published
//! and call the backend for the pixel work.
//!
//! ## Per-build dedupe
//!
//! Images are keyed by file name alone. The first post to publish a name
//! pays for the compression; later posts with the same name get a file copy
//! of that first result, so their `/posts/images/<code>/<name>` URLs still
//! resolve without compressing again:
//!
//! ```text
//! post a/photo.jpg ─ compress ─► images/a/photo.jpg   (recorded)
//! post b/photo.jpg ─ copy ─────► images/b/photo.jpg   (from images/a)
//! ```
//!
//! A name whose compression failed is recorded too and not retried within
//! the same build.

use super::backend::ImageBackend;
use super::params::{CompressParams, CompressSettings};
use super::rust_backend::has_supported_extension;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Build-scoped set of image names already handled, with the location of
/// the first successful compression (`None` when it failed).
#[derive(Debug, Default)]
pub struct ImageRecord {
    seen: BTreeMap<String, Option<PathBuf>>,
}

impl ImageRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn first_output(&self, name: &str) -> Option<&Path> {
        self.seen.get(name).and_then(|p| p.as_deref())
    }

    fn insert(&mut self, name: &str, output: Option<PathBuf>) {
        self.seen.insert(name.to_string(), output);
    }
}

/// What happened to one post's images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageStats {
    /// Newly compressed in this call.
    pub compressed: Vec<String>,
    /// Copied from an earlier post's compression.
    pub reused: Vec<String>,
    /// Image-named files that failed to decode.
    pub rejected: Vec<String>,
    /// Valid images whose compression failed.
    pub failed: Vec<String>,
}

impl ImageStats {
    pub fn merge(&mut self, other: ImageStats) {
        self.compressed.extend(other.compressed);
        self.reused.extend(other.reused);
        self.rejected.extend(other.rejected);
        self.failed.extend(other.failed);
    }
}

/// Valid and rejected image files in one directory, both sorted by name.
#[derive(Debug, Default)]
struct ImageScan {
    valid: Vec<String>,
    rejected: Vec<String>,
}

/// Sorted names of non-hidden regular files in `dir` with a supported image
/// extension. A missing directory has none.
fn image_candidates(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter(|e| has_supported_extension(&e.path()))
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    names
}

/// Decode every candidate in parallel; results keep name order.
fn scan_images(backend: &impl ImageBackend, dir: &Path) -> ImageScan {
    let checked: Vec<(String, bool)> = image_candidates(dir)
        .into_par_iter()
        .map(|name| {
            let path = dir.join(&name);
            match backend.validate(&path) {
                Ok(_) => (name, true),
                Err(e) => {
                    warn!("Skipping invalid image {}: {}", path.display(), e);
                    (name, false)
                }
            }
        })
        .collect();

    let mut scan = ImageScan::default();
    for (name, valid) in checked {
        if valid {
            scan.valid.push(name);
        } else {
            scan.rejected.push(name);
        }
    }
    scan
}

/// Names of the files in `dir` that decode as images, sorted. Corrupt files
/// are left out (with a warning), never reported as errors.
pub fn filter_invalid_images(backend: &impl ImageBackend, dir: &Path) -> Vec<String> {
    scan_images(backend, dir).valid
}

/// Publish the valid images of `post_dir` to `images_dir/<code>/`.
pub fn process_post_images(
    backend: &impl ImageBackend,
    post_dir: &Path,
    images_dir: &Path,
    code: &str,
    settings: CompressSettings,
    record: &mut ImageRecord,
) -> ImageStats {
    let scan = scan_images(backend, post_dir);
    let mut stats = ImageStats {
        rejected: scan.rejected,
        ..ImageStats::default()
    };
    let out_dir = images_dir.join(code);

    for name in scan.valid {
        let output = out_dir.join(&name);

        if record.contains(&name) {
            match record.first_output(&name) {
                Some(first) if first != output => match copy_file(first, &output) {
                    Ok(()) => {
                        debug!("Reused {} for {}", first.display(), output.display());
                        stats.reused.push(name);
                    }
                    Err(e) => warn!("Failed to reuse {}: {}", first.display(), e),
                },
                Some(_) => {}
                None => debug!("Skipping {name}: compression already failed in this build"),
            }
            continue;
        }

        let params = CompressParams::new(post_dir.join(&name), output.clone(), settings);
        match backend.compress(&params) {
            Ok(_) => {
                record.insert(&name, Some(output));
                stats.compressed.push(name);
            }
            Err(e) => {
                warn!("Failed to compress {}: {}", params.source.display(), e);
                record.insert(&name, None);
                stats.failed.push(name);
            }
        }
    }

    stats
}

fn copy_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}
