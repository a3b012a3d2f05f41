//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate (pure Rust decoders) |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Auto-orient | decoder orientation + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Thumbnail crop | `DynamicImage::resize_to_fill` |
//! | Watermark | `font8x8` bitmap glyphs, alpha-blended in [`watermark`](super::watermark) |
//! | Encode | `JpegEncoder` with quality, `PngEncoder`, or `DynamicImage::write_to` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::chain::{ImageChain, probe_dimensions};
use super::params::{CompressParams, ThumbnailParams};

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

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        probe_dimensions(source)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        ImageChain::decode(&params.source)?
            .auto_orient()
            .strip()
            .cover(params.width, params.height)
            .quality(params.quality)
            .write(&params.output)
    }

    fn compress(&self, params: &CompressParams) -> Result<(), BackendError> {
        let chain = ImageChain::decode(&params.source)?
            .auto_orient()
            .strip()
            .resize_to_width(params.max_width)
            .quality(params.quality);

        let chain = match &params.watermark {
            Some(overlay) => chain.draw_text(overlay),
            None => chain,
        };
        chain.write(&params.output)
    }
}
