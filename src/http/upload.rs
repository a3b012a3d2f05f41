//! Upload handlers.
//!
//! `POST /upload/image` runs the transformation pipeline; `POST /upload/file`
//! stores parts unmodified. Both read the whole multipart body into memory
//! before doing any work, bounded by the request body limit and `max_files`.

use super::AppState;
use super::error::ApiError;
use crate::imaging::RustBackend;
use crate::naming::passthrough_filename;
use crate::process::{PipelineConfig, ProcessError, process_batch};
use crate::types::{BatchOptions, BatchResponse, BatchTimestamp, UploadedFile};
use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Form field carrying file parts.
pub const FILE_FIELD: &str = "file";
const UNKNOWN_NAME: &str = "unknown";
const DEFAULT_MIME: &str = "application/octet-stream";

/// Parsed multipart body.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub with_thumbnail: Option<String>,
    pub watermark: Option<String>,
}

/// Read every part of the request.
///
/// `file` parts become [`UploadedFile`]s in arrival order. `withThumbnail`
/// and `watermark` are read as text. Any other field is ignored.
pub async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_files: usize,
) -> Result<UploadForm, ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::Intake(format!("Expected a multipart body: {e}")))?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Intake(format!("Failed to read multipart: {e}")))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field_name.as_str() {
            FILE_FIELD => {
                if form.files.len() >= max_files {
                    return Err(ApiError::Intake(format!(
                        "Too many files: at most {max_files} per request"
                    )));
                }
                let original_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNKNOWN_NAME)
                    .to_string();
                let mime_type = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::Intake(format!("Failed to read file {original_name}: {e}"))
                })?;
                form.files
                    .push(UploadedFile::new(original_name, mime_type, data));
            }
            "withThumbnail" => form.with_thumbnail = Some(read_text(field).await?),
            "watermark" => form.watermark = Some(read_text(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| ApiError::Intake(format!("Failed to read field {name}: {e}")))
}

/// `POST /upload/image`
#[tracing::instrument(name = "upload_image", skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let config = &state.config;
    let form = read_form(multipart, config.upload.max_files).await?;
    let options = BatchOptions::from_form(
        form.with_thumbnail.as_deref(),
        form.watermark.as_deref(),
        config.images.quality,
    );
    let pipeline = PipelineConfig {
        output_dir: config.server.storage_dir.clone(),
        max_width: config.images.max_width,
    };
    let files = form.files;

    info!(
        files = files.len(),
        thumbnails = options.generate_thumbnail,
        watermark = options.watermark_text.is_some(),
        "Image batch received"
    );

    let processed = tokio::task::spawn_blocking(move || {
        process_batch(&RustBackend::new(), &files, &options, &pipeline)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Batch worker failed: {e}")))??;

    Ok(Json(BatchResponse { files: processed }))
}

/// One file stored by `POST /upload/file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "originalname")]
    pub original_name: String,
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Name inside the storage directory.
    pub filename: String,
    /// Storage directory joined with `filename`.
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredResponse {
    pub files: Vec<StoredFile>,
}

/// `POST /upload/file`
#[tracing::instrument(name = "upload_file", skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StoredResponse>, ApiError> {
    let config = &state.config;
    let form = read_form(multipart, config.upload.max_files).await?;
    let timestamp = BatchTimestamp::now();
    let storage = config.storage_dir();

    let mut seen = HashSet::with_capacity(form.files.len());
    for file in &form.files {
        let filename = passthrough_filename(timestamp, &file.original_name);
        if !seen.insert(filename.clone()) {
            return Err(ProcessError::DuplicateName(filename).into());
        }
    }

    tokio::fs::create_dir_all(storage).await?;
    let mut stored = Vec::with_capacity(form.files.len());
    for file in form.files {
        let filename = passthrough_filename(timestamp, &file.original_name);
        let path = storage.join(&filename);
        tokio::fs::write(&path, &file.buffer).await?;
        stored.push(StoredFile {
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            filename,
            path: path.to_string_lossy().into_owned(),
        });
    }

    info!(files = stored.len(), "Files stored");
    Ok(Json(StoredResponse { files: stored }))
}
