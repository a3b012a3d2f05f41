//! Batch transformation scheduling.
//!
//! Takes the ordered list of uploaded files and the batch options, fans out
//! one task per artifact, and hands the results to the
//! [assembler](crate::assemble).
//!
//! ## Tasks
//!
//! For each file index `i`:
//! - a **primary** task always (width-capped re-encode, optional watermark)
//! - a **thumbnail** task when thumbnails were requested (200×200 cover crop)
//!
//! A batch of N files with thumbnails therefore issues 2N tasks.
//!
//! ## Output Structure
//!
//! All artifacts of a batch share one millisecond timestamp:
//!
//! ```text
//! storage/
//! ├── 1700000000000-dawn.jpg          # primary
//! ├── 1700000000000-dawn.thumb.jpg    # thumbnail
//! ├── 1700000000000-dusk.png
//! └── 1700000000000-dusk.thumb.png
//! ```
//!
//! ## Parallel Processing
//!
//! Every task of the batch runs on the [rayon](https://docs.rs/rayon) pool at
//! once, not per file. The scheduler waits for all of them before looking at
//! any result.
//!
//! ## Failure
//!
//! One failed task fails the whole batch. Sibling tasks are not cancelled and
//! files they already wrote stay on disk; the count is logged.

use crate::assemble::assemble_response;
use crate::imaging::operations::{CompressConfig, DEFAULT_MAX_WIDTH};
use crate::imaging::{BackendError, ImageBackend, Quality, compress_image, create_thumbnail};
use crate::naming::output_filename;
use crate::types::{
    ArtifactKind, BatchOptions, BatchTimestamp, ResponseFile, TransformationResult,
    TransformationTask, UploadedFile,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Two uploads in this batch would both be stored as {0}")]
    DuplicateName(String),
    #[error("Failed to create {kind} for {original_name}: {source}")]
    Transform {
        file_index: usize,
        kind: ArtifactKind,
        original_name: String,
        #[source]
        source: BackendError,
    },
    #[error("No primary artifact produced for file {file_index}")]
    MissingPrimary { file_index: usize },
    #[error("No thumbnail produced for file {file_index}")]
    MissingThumbnail { file_index: usize },
    #[error("Unexpected result for file {file_index}")]
    UnexpectedResult { file_index: usize },
}

/// Where and how large the pipeline writes.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub max_width: u32,
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

/// Build the flat task list: primary for every file, thumbnail when requested.
pub fn plan_tasks<'a>(
    files: &'a [UploadedFile],
    options: &BatchOptions,
) -> Vec<TransformationTask<'a>> {
    let mut tasks = Vec::with_capacity(files.len() * 2);
    for (file_index, source) in files.iter().enumerate() {
        tasks.push(TransformationTask {
            file_index,
            kind: ArtifactKind::Primary,
            source,
        });
        if options.generate_thumbnail {
            tasks.push(TransformationTask {
                file_index,
                kind: ArtifactKind::Thumbnail,
                source,
            });
        }
    }
    tasks
}

/// Reject the batch when two tasks would write the same output file.
fn check_unique_outputs(
    tasks: &[TransformationTask<'_>],
    timestamp: BatchTimestamp,
) -> Result<(), ProcessError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        let name = output_filename(timestamp, &task.source.original_name, task.kind);
        if !seen.insert(name.clone()) {
            return Err(ProcessError::DuplicateName(name));
        }
    }
    Ok(())
}

fn run_task(
    backend: &impl ImageBackend,
    task: &TransformationTask<'_>,
    options: &BatchOptions,
    config: &PipelineConfig,
    timestamp: BatchTimestamp,
) -> Result<TransformationResult, ProcessError> {
    let outcome = match task.kind {
        ArtifactKind::Thumbnail => {
            create_thumbnail(backend, task.source, &config.output_dir, timestamp)
        }
        ArtifactKind::Primary => {
            let compress = CompressConfig {
                max_width: config.max_width,
                quality: Quality::new(options.quality),
                watermark: options.watermark_text.clone(),
            };
            compress_image(backend, task.source, &config.output_dir, timestamp, &compress)
        }
    };

    match outcome {
        Ok(output_filename) => {
            debug!(file_index = task.file_index, kind = %task.kind, output = %output_filename, "artifact written");
            Ok(TransformationResult {
                file_index: task.file_index,
                kind: task.kind,
                output_filename,
            })
        }
        Err(source) => Err(ProcessError::Transform {
            file_index: task.file_index,
            kind: task.kind,
            original_name: task.source.original_name.clone(),
            source,
        }),
    }
}

/// Process one upload batch, stamping every output with the current time.
pub fn process_batch(
    backend: &impl ImageBackend,
    files: &[UploadedFile],
    options: &BatchOptions,
    config: &PipelineConfig,
) -> Result<Vec<ResponseFile>, ProcessError> {
    process_batch_at(backend, files, options, config, BatchTimestamp::now())
}

/// Process one upload batch with an explicit timestamp.
#[tracing::instrument(
    name = "batch",
    skip_all,
    fields(files = files.len(), timestamp = %timestamp)
)]
pub fn process_batch_at(
    backend: &impl ImageBackend,
    files: &[UploadedFile],
    options: &BatchOptions,
    config: &PipelineConfig,
    timestamp: BatchTimestamp,
) -> Result<Vec<ResponseFile>, ProcessError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let tasks = plan_tasks(files, options);
    check_unique_outputs(&tasks, timestamp)?;
    std::fs::create_dir_all(&config.output_dir)?;

    info!(tasks = tasks.len(), "Processing batch");

    // Collect every outcome before inspecting any: no task is cancelled.
    let outcomes: Vec<Result<TransformationResult, ProcessError>> = tasks
        .par_iter()
        .map(|task| run_task(backend, task, options, config, timestamp))
        .collect();

    let written = outcomes.iter().filter(|o| o.is_ok()).count();
    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }

    if let Some(error) = first_error {
        warn!(
            error = %error,
            leaked = written,
            "Batch failed; artifacts already written are left on disk"
        );
        return Err(error);
    }

    assemble_response(files, options, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    const TS: BatchTimestamp = BatchTimestamp(1_700_000_000_000);

    fn upload(name: &str, content: &[u8]) -> UploadedFile {
        UploadedFile::new(name, "image/jpeg", content.to_vec())
    }

    fn with_thumbnails() -> BatchOptions {
        BatchOptions {
            generate_thumbnail: true,
            ..BatchOptions::default()
        }
    }

    fn config(tmp: &TempDir) -> PipelineConfig {
        PipelineConfig::new(tmp.path().join("storage"))
    }

    // =========================================================================
    // Task planning
    // =========================================================================

    #[test]
    fn plan_primary_only_without_thumbnails() {
        let files = vec![upload("a.jpg", b"x"), upload("b.jpg", b"y")];
        let tasks = plan_tasks(&files, &BatchOptions::default());

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.kind == ArtifactKind::Primary));
        assert_eq!(tasks[1].file_index, 1);
    }

    #[test]
    fn plan_two_tasks_per_file_with_thumbnails() {
        let files = vec![upload("a.jpg", b"x"), upload("b.jpg", b"y")];
        let tasks = plan_tasks(&files, &with_thumbnails());

        assert_eq!(tasks.len(), 4);
        let thumbs = tasks
            .iter()
            .filter(|t| t.kind == ArtifactKind::Thumbnail)
            .count();
        assert_eq!(thumbs, 2);
    }

    // =========================================================================
    // Batch processing with mock backend
    // =========================================================================

    #[test]
    fn empty_batch_launches_nothing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out =
            process_batch_at(&backend, &[], &with_thumbnails(), &config(&tmp), TS).unwrap();

        assert!(out.is_empty());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn batch_with_thumbnails_produces_both_paths() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![upload("dawn.jpg", b"x"), upload("dusk.png", b"y")];

        let out = process_batch_at(&backend, &files, &with_thumbnails(), &config(&tmp), TS)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].original_name, "dawn.jpg");
        assert_eq!(out[0].path, "1700000000000-dawn.jpg");
        assert_eq!(
            out[0].thumbnail_path.as_deref(),
            Some("1700000000000-dawn.thumb.jpg")
        );
        assert_eq!(out[1].path, "1700000000000-dusk.png");
        // identify + compress + thumbnail per file
        assert_eq!(backend.get_operations().len(), 6);
    }

    #[test]
    fn batch_without_thumbnails_has_no_thumbnail_path() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![upload("a.png", b"x")];

        let out = process_batch_at(&backend, &files, &BatchOptions::default(), &config(&tmp), TS)
            .unwrap();

        assert_eq!(out[0].thumbnail_path, None);
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(_)));
        assert!(matches!(&ops[1], RecordedOp::Compress { .. }));
    }

    #[test]
    fn batch_forwards_watermark_and_quality() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![upload("a.jpg", b"x")];
        let options = BatchOptions {
            watermark_text: Some("Acme".into()),
            quality: 65,
            ..BatchOptions::default()
        };

        process_batch_at(&backend, &files, &options, &config(&tmp), TS).unwrap();

        let compress = backend
            .get_operations()
            .into_iter()
            .find(|op| matches!(op, RecordedOp::Compress { .. }))
            .unwrap();
        assert!(matches!(
            compress,
            RecordedOp::Compress { quality: 65, watermark: Some(ref w), .. } if w == "© Acme"
        ));
    }

    #[test]
    fn output_order_follows_upload_order_not_completion() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        // First file is slow, so its tasks finish last.
        let files = vec![
            upload("first.jpg", b"slow"),
            upload("second.jpg", b"fast"),
            upload("third.jpg", b"fast"),
        ];

        let out = process_batch_at(&backend, &files, &with_thumbnails(), &config(&tmp), TS)
            .unwrap();

        let names: Vec<_> = out.iter().map(|f| f.original_name.as_str()).collect();
        assert_eq!(names, ["first.jpg", "second.jpg", "third.jpg"]);
        assert_eq!(out[0].path, "1700000000000-first.jpg");
        assert_eq!(out[2].path, "1700000000000-third.jpg");
    }

    #[test]
    fn one_failure_fails_the_batch() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![upload("good.jpg", b"ok"), upload("bad.jpg", b"corrupt")];

        let err = process_batch_at(&backend, &files, &with_thumbnails(), &config(&tmp), TS)
            .unwrap_err();

        assert!(matches!(
            err,
            ProcessError::Transform { file_index: 1, ref original_name, .. } if original_name == "bad.jpg"
        ));
    }

    #[test]
    fn siblings_run_to_completion_after_failure() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![
            upload("bad.jpg", b"corrupt"),
            upload("b.jpg", b"ok"),
            upload("c.jpg", b"ok"),
        ];

        let result = process_batch_at(&backend, &files, &with_thumbnails(), &config(&tmp), TS);

        assert!(result.is_err());
        // bad.jpg: identify fails, its thumbnail still runs; b and c run all three
        assert_eq!(backend.get_operations().len(), 8);
    }

    #[test]
    fn failed_batch_leaves_sibling_outputs_on_disk() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::touching_outputs();
        let config = config(&tmp);
        let files = vec![upload("good.jpg", b"ok"), upload("bad.jpg", b"corrupt")];

        let result = process_batch_at(&backend, &files, &with_thumbnails(), &config, TS);

        assert!(result.is_err());
        assert!(config.output_dir.join("1700000000000-good.jpg").exists());
        assert!(config.output_dir.join("1700000000000-good.thumb.jpg").exists());
        assert!(!config.output_dir.join("1700000000000-bad.jpg").exists());
    }

    #[test]
    fn first_failure_in_task_order_is_reported() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![upload("x.jpg", b"corrupt"), upload("y.jpg", b"corrupt")];

        let err = process_batch_at(&backend, &files, &BatchOptions::default(), &config(&tmp), TS)
            .unwrap_err();

        assert!(matches!(err, ProcessError::Transform { file_index: 0, .. }));
    }

    #[test]
    fn duplicate_names_rejected_before_any_task() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let files = vec![upload("a.jpg", b"x"), upload("dir/a.jpg", b"y")];

        let err = process_batch_at(&backend, &files, &BatchOptions::default(), &config(&tmp), TS)
            .unwrap_err();

        assert!(matches!(err, ProcessError::DuplicateName(ref n) if n == "1700000000000-a.jpg"));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn thumbnail_colliding_with_another_primary_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        // a.jpg's thumbnail and a.thumb.jpg's primary share a name
        let files = vec![upload("a.jpg", b"x"), upload("a.thumb.jpg", b"y")];

        let err = process_batch_at(&backend, &files, &with_thumbnails(), &config(&tmp), TS)
            .unwrap_err();
        assert!(matches!(err, ProcessError::DuplicateName(_)));

        // Without thumbnails the same pair is fine.
        process_batch_at(&backend, &files, &BatchOptions::default(), &config(&tmp), TS).unwrap();
    }

    #[test]
    fn creates_missing_output_directory() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let config = PipelineConfig::new(tmp.path().join("nested").join("storage"));

        process_batch_at(&backend, &[upload("a.jpg", b"x")], &BatchOptions::default(), &config, TS)
            .unwrap();

        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn process_batch_stamps_current_time() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let before = BatchTimestamp::now();

        let out = process_batch(
            &backend,
            &[upload("a.jpg", b"x")],
            &BatchOptions::default(),
            &config(&tmp),
        )
        .unwrap();

        let stamp: i64 = out[0].path.split('-').next().unwrap().parse().unwrap();
        assert!(stamp >= before.0);
    }
}
