//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two pixel-level operations variant
//! generation needs: reading dimensions and writing a resized copy. The
//! production implementation is [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ResizeParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("refusing to write {}: it is the original of another item", .0.display())]
    ProtectedOutput(PathBuf),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Write one resized variant.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
