//! High-level image operations.
//!
//! These functions combine naming and calculations with backend execution.
//! They take one uploaded file, compute parameters, call the backend, and
//! return the output filename relative to the storage directory.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_watermark_font_size;
use super::params::{CompressParams, Quality, TextOverlay, ThumbnailParams, WATERMARK_FILL};
use crate::naming::output_filename;
use crate::types::{ArtifactKind, BatchTimestamp, UploadedFile};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Thumbnails are always this square extent.
pub const THUMBNAIL_SIZE: u32 = 200;
/// Thumbnail quality is fixed and independent of the batch quality.
pub const THUMBNAIL_QUALITY: u32 = 80;
/// Default width cap for primary artifacts.
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok(dims.as_tuple())
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(file: &UploadedFile, output_path: &Path) -> ThumbnailParams {
    ThumbnailParams {
        source: file.buffer.clone(),
        output: output_path.to_path_buf(),
        width: THUMBNAIL_SIZE,
        height: THUMBNAIL_SIZE,
        quality: Quality::new(THUMBNAIL_QUALITY),
    }
}

/// Create the 200×200 thumbnail of one uploaded file.
///
/// Returns the output filename, `{timestamp}-{basename}.thumb{ext}`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    file: &UploadedFile,
    output_dir: &Path,
    timestamp: BatchTimestamp,
) -> Result<String> {
    let name = output_filename(timestamp, &file.original_name, ArtifactKind::Thumbnail);
    let params = plan_thumbnail(file, &output_dir.join(&name));
    backend.thumbnail(&params)?;
    Ok(name)
}

/// Configuration for primary (compressed) artifacts.
#[derive(Debug, Clone)]
pub struct CompressConfig {
    pub max_width: u32,
    pub quality: Quality,
    /// Watermark text without the `©` prefix.
    pub watermark: Option<String>,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: Quality::default(),
            watermark: None,
        }
    }
}

/// Watermark overlay for a source of the given intrinsic dimensions.
///
/// The text is prefixed with `© `; the inset from both edges equals the font size.
pub fn plan_watermark(text: &str, original_dims: (u32, u32), max_width: u32) -> TextOverlay {
    let font_size = calculate_watermark_font_size(original_dims, max_width);
    TextOverlay {
        text: format!("© {text}"),
        font_size,
        inset: font_size,
        fill: WATERMARK_FILL,
    }
}

/// Plan a compress operation without executing it.
///
/// `original_dims` only affects the watermark overlay.
pub fn plan_compress(
    file: &UploadedFile,
    output_path: &Path,
    original_dims: (u32, u32),
    config: &CompressConfig,
) -> CompressParams {
    CompressParams {
        source: file.buffer.clone(),
        output: output_path.to_path_buf(),
        max_width: config.max_width,
        quality: config.quality,
        watermark: config
            .watermark
            .as_deref()
            .map(|text| plan_watermark(text, original_dims, config.max_width)),
    }
}

/// Create the primary artifact of one uploaded file.
///
/// Reads the source dimensions first; the watermark font size depends on
/// them, and an unreadable header fails the task before any decode. Returns
/// the output filename, `{timestamp}-{basename}{ext}`.
pub fn compress_image(
    backend: &impl ImageBackend,
    file: &UploadedFile,
    output_dir: &Path,
    timestamp: BatchTimestamp,
    config: &CompressConfig,
) -> Result<String> {
    let name = output_filename(timestamp, &file.original_name, ArtifactKind::Primary);
    let original_dims = get_dimensions(backend, &file.buffer)?;
    let params = plan_compress(file, &output_dir.join(&name), original_dims, config);
    backend.compress(&params)?;
    Ok(name)
}
