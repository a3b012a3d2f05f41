//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Thumbnail** | auto-orient + `resize_to_fill` (200×200) |
//! | **Compress** | auto-orient + width-capped Lanczos3 resize + optional watermark |
//! | **Watermark** | `font8x8` bitmap glyphs, alpha-blended |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Chain**: [`ImageChain`], the fluent per-artifact primitive chain
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod chain;
pub mod operations;
mod params;
pub mod rust_backend;
mod watermark;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_primary_dimensions, calculate_watermark_font_size};
pub use chain::ImageChain;
pub use operations::{CompressConfig, compress_image, create_thumbnail, get_dimensions};
pub use params::{CompressParams, Quality, TextOverlay, ThumbnailParams};
pub use rust_backend::RustBackend;
