//! Shared setup for HTTP integration tests.

#![allow(dead_code)]

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use image::{DynamicImage, ImageFormat, RgbImage};
use image_press::config::ServiceConfig;
use image_press::http::{AppState, router};
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub storage: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Names of every file currently in the storage directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.storage) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// Start the service on an isolated storage directory with default limits.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

pub fn setup_test_app_with(customize: impl FnOnce(&mut ServiceConfig)) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let storage = temp_dir.path().join("storage");

    let mut config = ServiceConfig::default();
    config.server.storage_dir = storage.clone();
    customize(&mut config);

    let server = TestServer::new(router(AppState::new(config))).unwrap();
    TestApp {
        server,
        storage,
        _temp_dir: temp_dir,
    }
}

fn pattern(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    pattern(width, height).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn file_part(name: &str, mime: &str, data: Vec<u8>) -> Part {
    Part::bytes(bytes::Bytes::from(data))
        .file_name(name.to_string())
        .mime_type(mime.to_string())
}

pub fn jpeg_part(name: &str, width: u32, height: u32) -> Part {
    file_part(name, "image/jpeg", create_test_jpeg(width, height))
}

pub fn png_part(name: &str, width: u32, height: u32) -> Part {
    file_part(name, "image/png", create_test_png(width, height))
}

/// Form with the given file parts under the `file` field.
pub fn form_with(parts: Vec<Part>) -> MultipartForm {
    parts
        .into_iter()
        .fold(MultipartForm::new(), |form, part| form.add_part("file", part))
}
