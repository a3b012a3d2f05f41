//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what artifacts to create and how to name them) and the
//! [`backend`](super::backend) (which does the pixel work). The split lets the
//! scheduler run against a recording mock in tests.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`TextOverlay`]: Watermark text, glyph size and anchor inset.
//! - [`ThumbnailParams`]: Source buffer, output path, fixed crop extent, quality.
//! - [`CompressParams`]: Source buffer, output path, width cap, quality, optional overlay.

use bytes::Bytes;
use std::path::PathBuf;

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
        Self(80)
    }
}

/// Text drawn over the bottom-right corner of a primary artifact.
///
/// `font_size` is the nominal size in pixels; `inset` is the distance kept
/// from the right and bottom edges.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub font_size: f64,
    pub inset: f64,
    /// RGBA fill; the alpha channel sets the transparency.
    pub fill: [u8; 4],
}

/// Semi-transparent white, `#FFFFFFAA`.
pub const WATERMARK_FILL: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xAA];

/// Parameters for a thumbnail: cover-resize then center-crop to an exact extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: Bytes,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a primary artifact: width-capped resize, optional overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    pub source: Bytes,
    pub output: PathBuf,
    /// Images wider than this are scaled down; narrower ones keep their size.
    pub max_width: u32,
    pub quality: Quality,
    pub watermark: Option<TextOverlay>,
}
