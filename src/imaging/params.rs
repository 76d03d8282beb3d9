//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which decides which images a post
//! publishes, and the [`backend`](super::backend), which does the pixel work.
//! A mock backend can therefore stand in for the real one in tests.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 85), clamped on construction.
//! - [`CompressSettings`]: build-wide knobs from `[images]` in `site.toml`.
//! - [`CompressParams`]: one concrete compression job.

use std::path::PathBuf;

/// Longer-edge bound for published images.
pub const DEFAULT_MAX_SIZE: u32 = 720;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// How every image in a build is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressSettings {
    /// Longer edge in pixels. Smaller images are never enlarged.
    pub max_size: u32,
    pub quality: Quality,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            quality: Quality::default(),
        }
    }
}

/// Parameters for a single compression: decode `source`, bound it to
/// `max_size`, encode to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_size: u32,
    pub quality: Quality,
}

impl CompressParams {
    pub fn new(source: PathBuf, output: PathBuf, settings: CompressSettings) -> Self {
        Self {
            source,
            output,
            max_size: settings.max_size,
            quality: settings.quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn defaults_match_published_settings() {
        let settings = CompressSettings::default();
        assert_eq!(settings.quality.value(), 85);
        assert_eq!(settings.max_size, 720);
    }

    #[test]
    fn params_copy_settings() {
        let settings = CompressSettings {
            max_size: 100,
            quality: Quality::new(60),
        };
        let params = CompressParams::new("a.jpg".into(), "out/a.jpg".into(), settings);
        assert_eq!(params.max_size, 100);
        assert_eq!(params.quality.value(), 60);
        assert_eq!(params.output, PathBuf::from("out/a.jpg"));
    }
}
