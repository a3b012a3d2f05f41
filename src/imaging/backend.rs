//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from its image collaborator: identify, thumbnail, and compress.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Everything is statically linked into the binary.

use super::params::{CompressParams, ThumbnailParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Source bytes are not a decodable image.
    #[error("Decode failed: {0}")]
    Decode(String),
    /// Encoding or writing the output image failed.
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: one backend instance is shared by every
/// task of a batch running on the rayon pool.
pub trait ImageBackend: Sync {
    /// Stored dimensions of an encoded image, orientation not applied.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Execute a thumbnail operation (cover resize + center crop).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Execute a compress operation (width cap, re-encode, optional overlay).
    fn compress(&self, params: &CompressParams) -> Result<(), BackendError>;
}
