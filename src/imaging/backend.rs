//! Image probing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between dimension resolution and
//! the filesystem. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), which reads image
//! headers with the `image` and `avif-parse` crates. Tests swap in a mock
//! that never touches disk.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("Failed to read image header: {0}")]
    Decode(String),
    #[error("Image has zero width or height: {}", .0.display())]
    Empty(PathBuf),
}

/// Intrinsic pixel size of an image asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image probing backends.
///
/// `Sync` so a single backend can be shared by rayon workers annotating the
/// images of one or many documents.
pub trait ImageBackend: Sync {
    /// Read the intrinsic dimensions of the image at `path`.
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for &B {
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        (**self).identify(path)
    }
}
