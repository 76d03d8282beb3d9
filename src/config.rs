//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. The file lives in
//! the site root and is optional: stock defaults are serialized to a TOML
//! table, the user file is merged over it key by key, and the result is
//! deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]                        # Relative to the site root
//! posts = "posts"
//! pages = "pages"
//! static_dir = "static"
//! template = "static/template.html"
//! output = "build"
//!
//! [images]
//! quality = 85                   # AVIF quality (1-100)
//! max_size = 720                 # Longer edge in pixels
//!
//! [markdown]
//! theme = "InspiredGitHub"       # syntect theme for highlight.css
//!
//! [serve]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [pages.display_names]
//! about = "About me"             # Nav label override per page slug
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [images]
//! max_size = 1024
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::highlight::DEFAULT_THEME;
use crate::imaging::{CompressSettings, DEFAULT_MAX_SIZE, Quality};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Post image compression settings.
    pub images: ImagesConfig,
    /// Markdown rendering settings.
    pub markdown: MarkdownConfig,
    /// Dev server address.
    pub serve: ServeConfig,
    /// Page navigation settings.
    pub pages: PagesConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_size == 0 {
            return Err(ConfigError::Validation(
                "images.max_size must be non-zero".into(),
            ));
        }
        if self.markdown.theme.trim().is_empty() {
            return Err(ConfigError::Validation(
                "markdown.theme must not be empty".into(),
            ));
        }
        if self.serve.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "serve.host must not be empty".into(),
            ));
        }
        for (key, value) in [
            ("paths.posts", &self.paths.posts),
            ("paths.pages", &self.paths.pages),
            ("paths.static_dir", &self.paths.static_dir),
            ("paths.template", &self.paths.template),
            ("paths.output", &self.paths.output),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Input and output locations, relative to the site root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// One sub-directory per post, each holding `index.md` and its images.
    pub posts: String,
    /// `.html` and `.md` pages; `index` becomes the home page.
    pub pages: String,
    /// Copied verbatim to the output root.
    pub static_dir: String,
    /// Page template with `{{ content }}` and `{{ nav_links }}`.
    pub template: String,
    /// Build output directory.
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts: "posts".to_string(),
            pages: "pages".to_string(),
            static_dir: "static".to_string(),
            template: "static/template.html".to_string(),
            output: "build".to_string(),
        }
    }
}

impl PathsConfig {
    /// Absolute locations for a site rooted at `root`.
    pub fn resolve(&self, root: &Path) -> SitePaths {
        SitePaths {
            posts: root.join(&self.posts),
            pages: root.join(&self.pages),
            static_dir: root.join(&self.static_dir),
            template: root.join(&self.template),
            output: root.join(&self.output),
        }
    }
}

/// [`PathsConfig`] resolved against a site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub posts: PathBuf,
    pub pages: PathBuf,
    pub static_dir: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
}

impl SitePaths {
    pub fn output_images(&self) -> PathBuf {
        self.output.join("posts").join("images")
    }

    /// Source directories a dev-server watcher should observe.
    pub fn watched(&self) -> Vec<&Path> {
        vec![&self.posts, &self.pages, &self.static_dir]
    }
}

/// Post image compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// AVIF encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Longer edge in pixels; smaller images are never enlarged.
    pub max_size: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl ImagesConfig {
    pub fn compress_settings(&self) -> CompressSettings {
        CompressSettings {
            max_size: self.max_size,
            quality: Quality::new(self.quality),
        }
    }
}

/// Markdown rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Bundled syntect theme used to generate `highlight.css`.
    pub theme: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Dev server address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Page navigation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Navigation label per page slug. Unlisted pages use the capitalized
    /// slug.
    pub display_names: BTreeMap<String, String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `site.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Blogsmith Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the site root as site.toml.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths (relative to the site root)
# ---------------------------------------------------------------------------
[paths]
# One directory per post: posts/<code>/index.md plus its images.
posts = "posts"

# Top-level pages (.html inserted verbatim, .md rendered). index becomes /.
pages = "pages"

# Copied as-is to the output root.
static_dir = "static"

# Page template; must contain {{ content }} and {{ nav_links }}.
template = "static/template.html"

# Build output directory.
output = "build"

# ---------------------------------------------------------------------------
# Post images
# ---------------------------------------------------------------------------
[images]
# AVIF encoding quality (1 = worst, 100 = best).
quality = 85

# Longer edge in pixels. Smaller images are never enlarged.
max_size = 720

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
# syntect theme used for highlight.css. Bundled themes include
# "InspiredGitHub", "base16-ocean.dark", "base16-ocean.light",
# "Solarized (dark)" and "Solarized (light)".
theme = "InspiredGitHub"

# ---------------------------------------------------------------------------
# Dev server (--dev); --host and --port override these
# ---------------------------------------------------------------------------
[serve]
host = "127.0.0.1"
port = 8000

# ---------------------------------------------------------------------------
# Navigation labels
# ---------------------------------------------------------------------------
[pages.display_names]
# Defaults to the capitalized file name (about.html -> "About").
# about = "About me"
"##
}
