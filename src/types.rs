//! Shared types for one upload batch.
//!
//! Everything here lives for exactly one request: the intake layer builds the
//! [`UploadedFile`] list and [`BatchOptions`], the scheduler turns them into
//! [`TransformationTask`]s, and the assembler folds the
//! [`TransformationResult`]s back into [`ResponseFile`]s in upload order.
//!
//! The `ResponseFile` field names on the wire (`originalname`, `mimetype`,
//! `size`, `thumbnailPath`) are the public JSON contract of
//! `POST /upload/image` and must not change.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default re-encode quality for primary artifacts.
pub const DEFAULT_QUALITY: u32 = 80;

/// One uploaded file, held in memory for the duration of the request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, e.g. `holiday.jpg`.
    pub original_name: String,
    pub buffer: Bytes,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        buffer: impl Into<Bytes>,
    ) -> Self {
        let buffer = buffer.into();
        Self {
            original_name: original_name.into(),
            size_bytes: buffer.len() as u64,
            mime_type: mime_type.into(),
            buffer,
        }
    }
}

/// Per-request options, parsed once from the form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub generate_thumbnail: bool,
    pub watermark_text: Option<String>,
    pub quality: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            generate_thumbnail: false,
            watermark_text: None,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl BatchOptions {
    /// Build options from raw form values.
    ///
    /// `with_thumbnail` is truthy when present and non-empty (any value,
    /// including `"false"`, counts). `watermark` applies only when non-empty.
    pub fn from_form(with_thumbnail: Option<&str>, watermark: Option<&str>, quality: u32) -> Self {
        Self {
            generate_thumbnail: with_thumbnail.is_some_and(|v| !v.is_empty()),
            watermark_text: watermark.filter(|w| !w.is_empty()).map(str::to_string),
            quality,
        }
    }
}

/// The two artifacts a file can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Thumbnail,
    Primary,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Thumbnail => f.write_str("thumbnail"),
            ArtifactKind::Primary => f.write_str("primary"),
        }
    }
}

/// Millisecond timestamp captured once per batch and shared by every
/// output filename in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchTimestamp(pub i64);

impl BatchTimestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }
}

impl fmt::Display for BatchTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work: a single artifact for a single file.
///
/// `file_index` is the only link back to the upload order; completion order
/// of tasks carries no meaning.
#[derive(Debug, Clone, Copy)]
pub struct TransformationTask<'a> {
    pub file_index: usize,
    pub kind: ArtifactKind,
    pub source: &'a UploadedFile,
}

/// Output of a successful task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationResult {
    pub file_index: usize,
    pub kind: ArtifactKind,
    pub output_filename: String,
}

/// One entry of the `files` array returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFile {
    #[serde(rename = "originalname")]
    pub original_name: String,
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub path: String,
    #[serde(
        rename = "thumbnailPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail_path: Option<String>,
}

/// Body of a successful `POST /upload/image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub files: Vec<ResponseFile>,
}
