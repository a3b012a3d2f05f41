//! Fold completed task results back into the ordered response list.
//!
//! Tasks finish in arbitrary order, so correspondence is never inferred from
//! position. Results are keyed by `(file_index, kind)` and looked up for each
//! uploaded file in upload order.

use crate::process::ProcessError;
use crate::types::{ArtifactKind, BatchOptions, ResponseFile, TransformationResult, UploadedFile};
use std::collections::HashMap;

/// Build one [`ResponseFile`] per uploaded file, in upload order.
///
/// Every file must have a primary result. A thumbnail result must be present
/// exactly when thumbnails were requested; any other mismatch is a defect in
/// the scheduler and surfaces as an error rather than a partial response.
pub fn assemble_response(
    files: &[UploadedFile],
    options: &BatchOptions,
    results: Vec<TransformationResult>,
) -> Result<Vec<ResponseFile>, ProcessError> {
    let mut by_key: HashMap<(usize, ArtifactKind), String> = HashMap::with_capacity(results.len());
    for result in results {
        let unexpected = result.file_index >= files.len()
            || (result.kind == ArtifactKind::Thumbnail && !options.generate_thumbnail);
        if unexpected {
            return Err(ProcessError::UnexpectedResult {
                file_index: result.file_index,
            });
        }
        let key = (result.file_index, result.kind);
        if by_key.insert(key, result.output_filename).is_some() {
            return Err(ProcessError::UnexpectedResult {
                file_index: result.file_index,
            });
        }
    }

    files
        .iter()
        .enumerate()
        .map(|(file_index, file)| {
            let path = by_key
                .remove(&(file_index, ArtifactKind::Primary))
                .ok_or(ProcessError::MissingPrimary { file_index })?;
            let thumbnail_path = by_key.remove(&(file_index, ArtifactKind::Thumbnail));
            if options.generate_thumbnail && thumbnail_path.is_none() {
                return Err(ProcessError::MissingThumbnail { file_index });
            }
            Ok(ResponseFile {
                original_name: file.original_name.clone(),
                mime_type: file.mime_type.clone(),
                size_bytes: file.size_bytes,
                path,
                thumbnail_path,
            })
        })
        .collect()
}
