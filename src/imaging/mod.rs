//! Image validation and compression, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Validate** | full decode via `image::ImageReader`, format sniffed from content |
//! | **Compress** | RGB8 + Lanczos3 bound to the longer edge + rav1e AVIF encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: per-post publishing with the build-wide [`ImageRecord`]

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_within;
pub use operations::{ImageRecord, ImageStats, filter_invalid_images, process_post_images};
pub use params::{CompressParams, CompressSettings, DEFAULT_MAX_SIZE, Quality};
pub use rust_backend::RustBackend;
