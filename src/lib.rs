//! # image-press
//!
//! A batch image upload service. Clients post up to ten images in one
//! multipart request; for every image the service writes a width-capped,
//! re-encoded primary (optionally watermarked) and, on request, a 200×200
//! thumbnail, then answers with the stored filenames in upload order.
//!
//! # Architecture: One Batch, Many Tasks
//!
//! ```text
//! multipart body ─▶ UploadedFile[] ─▶ tasks (primary + thumbnail per file)
//!                                         │  rayon, all at once
//!                                         ▼
//!                 ResponseFile[] ◀─ assemble by (file_index, kind)
//! ```
//!
//! - **Intake** ([`http`]) reads the whole request into memory and parses the
//!   `withThumbnail` and `watermark` fields once.
//! - **Scheduling** ([`process`]) fans every artifact of every file out to the
//!   rayon pool and waits for all of them. One failure fails the batch.
//! - **Assembly** ([`assemble`]) rebuilds upload order from task identity,
//!   never from completion order.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Per-request data model: uploads, options, tasks, results, response records |
//! | [`naming`] | `{timestamp}-{basename}[.thumb]{ext}` output filename contract |
//! | [`imaging`] | Pure-Rust image operations: identify, thumbnail, compress, watermark |
//! | [`process`] | Batch scheduler with fail-fast semantics |
//! | [`assemble`] | Ordered response reassembly |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`http`] | axum router, upload handlers, JSON error payloads |
//!
//! # Design Decisions
//!
//! ## Fail Fast, No Rollback
//!
//! A batch either succeeds for every file or returns an error. Tasks are not
//! cancelled when a sibling fails, and files already written stay on disk.
//! The scheduler logs how many artifacts were left behind.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, and encoding use the `image` crate; the watermark is
//! drawn with `font8x8` bitmap glyphs. There are no system libraries or font
//! files to install, and the output is identical on every machine.
//!
//! ## Timestamped Names
//!
//! All artifacts of a batch share one millisecond timestamp, so repeated
//! uploads of the same file never overwrite each other. Two uploads in one
//! batch that would map to the same name are rejected up front.

pub mod assemble;
pub mod config;
pub mod http;
pub mod imaging;
pub mod naming;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
