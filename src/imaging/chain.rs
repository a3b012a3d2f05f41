//! Fluent per-artifact operation chain.
//!
//! An [`ImageChain`] wraps one decoded buffer and applies primitives in the
//! order they are called, ending in [`ImageChain::write`]:
//!
//! ```text
//! ImageChain::decode(bytes)?
//!     .auto_orient()
//!     .strip()
//!     .cover(200, 200)
//!     .quality(Quality::new(80))
//!     .write(path)?
//! ```
//!
//! | Primitive | Implementation |
//! |---|---|
//! | decode | `ImageReader::with_guessed_format` → `into_decoder` |
//! | auto-orient | decoder `orientation()` + `DynamicImage::apply_orientation` |
//! | strip | drop the captured ICC profile; EXIF is never re-emitted |
//!
//! A chain that skips `strip` carries the source ICC profile through to JPEG
//! and PNG output.
//! | resize | `DynamicImage::resize_exact` (Lanczos3), width-capped, no upscaling |
//! | cover + crop | `DynamicImage::resize_to_fill` (Lanczos3, centered) |
//! | text overlay | [`watermark::draw_text`](super::watermark::draw_text) |
//! | write | format from output extension, JPEG quality honoured |

use super::backend::{BackendError, Dimensions};
use super::calculations::calculate_primary_dimensions;
use super::params::{Quality, TextOverlay};
use super::watermark;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Read the stored dimensions of an encoded image without decoding pixels.
///
/// The orientation flag is not applied.
pub fn probe_dimensions(source: &[u8]) -> Result<Dimensions, BackendError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(BackendError::Io)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
    Ok(Dimensions { width, height })
}

/// One image buffer and the pending state of its operation chain.
pub struct ImageChain {
    image: DynamicImage,
    source_format: Option<ImageFormat>,
    orientation: Orientation,
    icc_profile: Option<Vec<u8>>,
    quality: Quality,
}

impl ImageChain {
    /// Decode an in-memory buffer, capturing orientation and ICC profile.
    pub fn decode(source: &[u8]) -> Result<Self, BackendError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(BackendError::Io)?;
        let source_format = reader.format();
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("Unrecognised image data: {e}")))?;
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let icc_profile = decoder.icc_profile().ok().flatten();
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| BackendError::Decode(format!("Failed to decode image: {e}")))?;

        Ok(Self {
            image,
            source_format,
            orientation,
            icc_profile,
            quality: Quality::default(),
        })
    }

    /// Wrap an already-decoded image.
    pub fn from_image(image: DynamicImage, orientation: Orientation) -> Self {
        Self {
            image,
            source_format: None,
            orientation,
            icc_profile: None,
            quality: Quality::default(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Rotate/flip the pixels per the embedded orientation, then forget it.
    pub fn auto_orient(mut self) -> Self {
        self.image.apply_orientation(self.orientation);
        self.orientation = Orientation::NoTransforms;
        self
    }

    /// Drop embedded metadata so the encoded output carries pixels only.
    pub fn strip(mut self) -> Self {
        self.icc_profile = None;
        self
    }

    /// Scale down to at most `max_width`, preserving aspect ratio.
    pub fn resize_to_width(mut self, max_width: u32) -> Self {
        let current = self.dimensions();
        let (width, height) = calculate_primary_dimensions(current, max_width);
        if (width, height) != current {
            self.image = self.image.resize_exact(width, height, FilterType::Lanczos3);
        }
        self
    }

    /// Resize to cover `width`×`height`, then center-crop to exactly that extent.
    pub fn cover(mut self, width: u32, height: u32) -> Self {
        self.image = self.image.resize_to_fill(width, height, FilterType::Lanczos3);
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Draw a text overlay at the bottom-right corner.
    pub fn draw_text(mut self, overlay: &TextOverlay) -> Self {
        let mut canvas = self.image.to_rgba8();
        watermark::draw_text(&mut canvas, overlay);
        self.image = DynamicImage::ImageRgba8(canvas);
        self
    }

    /// Borrow the current pixels.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Encode to `path`, choosing the format from its extension.
    ///
    /// Falls back to the sniffed source format when the extension is unknown.
    pub fn write(self, path: &Path) -> Result<(), BackendError> {
        let format = ImageFormat::from_path(path)
            .ok()
            .or(self.source_format)
            .ok_or_else(|| {
                BackendError::Encode(format!("No output format for {}", path.display()))
            })?;
        let file = std::fs::File::create(path).map_err(BackendError::Io)?;
        let mut writer = BufWriter::new(file);
        self.encode(&mut writer, format)?;
        writer.flush().map_err(BackendError::Io)
    }

    fn encode<W: Write + std::io::Seek>(
        self,
        writer: &mut W,
        format: ImageFormat,
    ) -> Result<(), BackendError> {
        let encode_err = |e: image::ImageError| {
            BackendError::Encode(format!("{format:?} encode failed: {e}"))
        };
        let icc_err = |e: image::error::UnsupportedError| {
            BackendError::Encode(format!("{format:?} cannot embed ICC profile: {e}"))
        };
        match format {
            ImageFormat::Jpeg => {
                let image = if self.image.color().has_alpha() {
                    DynamicImage::ImageRgb8(self.image.to_rgb8())
                } else {
                    self.image
                };
                let mut encoder =
                    JpegEncoder::new_with_quality(writer, self.quality.value() as u8);
                if let Some(icc) = self.icc_profile {
                    encoder.set_icc_profile(icc).map_err(icc_err)?;
                }
                image.write_with_encoder(encoder).map_err(encode_err)
            }
            ImageFormat::Png => {
                let mut encoder = PngEncoder::new(writer);
                if let Some(icc) = self.icc_profile {
                    encoder.set_icc_profile(icc).map_err(icc_err)?;
                }
                self.image.write_with_encoder(encoder).map_err(encode_err)
            }
            other => self.image.write_to(writer, other).map_err(encode_err),
        }
    }
}
