//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate, format guessed from content |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//!
//! Compressed files keep their source file name so that rewritten post
//! URLs resolve; browsers sniff the AVIF payload regardless of extension.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_within;
use super::params::CompressParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in and known to work.
///
/// AVIF is excluded: the `image` crate's `"avif"` feature only enables the
/// **encoder** (rav1e), yet `ImageFormat::reading_enabled()` reports `true`
/// for it, so that API cannot be relied on alone.
const CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of [`supported_input_extensions`] (case-insensitive).
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from its bytes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode as AVIF using rav1e (speed=6 for reasonable throughput).
fn encode_avif(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut bytes, 6, quality as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))?;
    Ok(bytes)
}

/// The destination is only touched once encoding has succeeded.
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let bytes = encode_avif(img, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn validate(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let img = load_image(path)?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }

    fn compress(&self, params: &CompressParams) -> Result<Dimensions, BackendError> {
        let rgb = load_image(&params.source)?.to_rgb8();
        let (width, height) = fit_within(rgb.dimensions(), params.max_size);
        let rgb = if (width, height) == rgb.dimensions() {
            rgb
        } else {
            image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
        };

        if let Some(parent) = params.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        save_avif(
            &DynamicImage::ImageRgb8(rgb),
            &params.output,
            params.quality.value(),
        )?;
        Ok(Dimensions { width, height })
    }
}
