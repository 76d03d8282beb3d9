//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the blog needs:
//! validate (does this file decode as a raster image?) and compress
//! (decode, bound, re-encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate and statically linked into the binary.

use super::params::CompressParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// The rest of the codebase only talks to this trait, so tests can swap in
/// a recording mock. Backends are `Sync` because validation runs on the
/// rayon pool.
pub trait ImageBackend: Sync {
    /// Fully decode `path`, guessing the format from its content. Returns
    /// the dimensions of a valid image; any decode failure is an error.
    fn validate(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Execute a compression. Parent directories of the output are created
    /// and an existing output is overwritten. Returns the output dimensions.
    fn compress(&self, params: &CompressParams) -> Result<Dimensions, BackendError>;
}
