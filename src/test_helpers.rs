//! Shared test utilities for the image-press test suite.
//!
//! Builds small synthetic images in memory so tests never depend on fixture
//! files. The pixel pattern mixes two gradients with an XOR texture, which
//! gives lossy encoders real detail to work with.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let upload = UploadedFile::new("dawn.jpg", "image/jpeg", jpeg_bytes(800, 600));
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;

/// Deterministic RGB test pattern.
pub fn pattern(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    })
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(pattern(width, height))
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

/// Encoded JPEG of the test pattern.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Encoded PNG of the test pattern.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// Left half red, right half blue. Shows which way a rotation went.
pub fn halves(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([255, 0, 0])
        } else {
            image::Rgb([0, 0, 255])
        }
    })
}

/// Encoded JPEG of an arbitrary image, high quality so colours survive.
pub fn jpeg_of(image: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 95)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

/// Insert an EXIF APP1 segment carrying only an Orientation tag right after
/// the JPEG SOI marker.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
    app1.extend_from_slice(b"Exif\0\0");
    // Big-endian TIFF header, first IFD at offset 8
    app1.extend_from_slice(b"MM\0\x2A\0\0\0\x08");
    app1.extend_from_slice(&[0x00, 0x01]);
    // Tag 0x0112 (Orientation), SHORT, count 1
    app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    app1.extend_from_slice(&orientation.to_be_bytes());
    // Value padding, then no next IFD
    app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Encoded PNG of the test pattern with an embedded ICC profile.
pub fn png_with_icc(width: u32, height: u32, icc: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut encoder = PngEncoder::new(&mut buf);
    encoder.set_icc_profile(icc.to_vec()).unwrap();
    DynamicImage::ImageRgb8(pattern(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    buf
}

/// ICC profile and raw EXIF embedded in an encoded image.
pub fn embedded_metadata(bytes: &[u8]) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .unwrap()
        .into_decoder()
        .unwrap();
    (
        decoder.icc_profile().unwrap(),
        decoder.exif_metadata().unwrap(),
    )
}
