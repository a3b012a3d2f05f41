//! Output filename contract.
//!
//! Every artifact written to the storage directory is named from the batch
//! timestamp and the uploaded file's name:
//!
//! - primary:   `{timestamp}-{basename}{extension}` → `1700000000000-dawn.jpg`
//! - thumbnail: `{timestamp}-{basename}.thumb{extension}` → `1700000000000-dawn.thumb.jpg`
//!
//! Static file servers and clients locate outputs by these names, so the
//! format is part of the public contract.
//!
//! ## Splitting rules
//!
//! Only the final path component of the uploaded name is used, so a client
//! cannot steer output outside the storage directory. The extension is
//! everything from the last dot, dot included; a leading dot does not start
//! an extension:
//! - `"dawn.jpg"` → basename `"dawn"`, extension `".jpg"`
//! - `"archive.tar.gz"` → basename `"archive.tar"`, extension `".gz"`
//! - `".hidden"` → basename `".hidden"`, extension `""`
//! - `"../../etc/passwd"` → basename `"passwd"`, extension `""`

use crate::types::{ArtifactKind, BatchTimestamp};
use std::path::Path;

/// An uploaded filename split into the parts used for output names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub basename: String,
    /// Extension including the leading dot, or empty.
    pub extension: String,
}

/// Split an uploaded filename into basename and extension.
pub fn split_source_name(name: &str) -> SourceName {
    let path = Path::new(name);
    let Some(file_name) = path.file_name() else {
        return SourceName {
            basename: String::new(),
            extension: String::new(),
        };
    };
    let file_path = Path::new(file_name);
    let basename = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    SourceName {
        basename,
        extension,
    }
}

/// Filename of the thumbnail artifact.
pub fn thumbnail_filename(timestamp: BatchTimestamp, name: &SourceName) -> String {
    format!("{}-{}.thumb{}", timestamp, name.basename, name.extension)
}

/// Filename of the primary (compressed) artifact.
pub fn primary_filename(timestamp: BatchTimestamp, name: &SourceName) -> String {
    format!("{}-{}{}", timestamp, name.basename, name.extension)
}

/// Filename for either artifact kind of an uploaded file.
pub fn output_filename(timestamp: BatchTimestamp, original_name: &str, kind: ArtifactKind) -> String {
    let name = split_source_name(original_name);
    match kind {
        ArtifactKind::Thumbnail => thumbnail_filename(timestamp, &name),
        ArtifactKind::Primary => primary_filename(timestamp, &name),
    }
}

/// Filename for a passthrough upload stored unmodified.
pub fn passthrough_filename(timestamp: BatchTimestamp, original_name: &str) -> String {
    let name = split_source_name(original_name);
    format!("{}-{}{}", timestamp, name.basename, name.extension)
}
